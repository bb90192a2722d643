//! 约定解析器
//!
//! 启动期扫描登记的输入类型与命令类型：输入名去掉输入后缀、命令名去掉命令后缀后，
//! 同组且同名即建立绑定。绑定结果须与输入静态声明的 `InputMessage::Command` 一致。
//! 命令类型同时绑定到自身，以便直接处理命令消息。构建完成后绑定表只读。

use crate::{
    command::{Command, InputMessage},
    config::EngineConfig,
    error::{AppError, ConfigurationError},
};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// 单个命令类型的配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandConfiguration {
    command_type: TypeId,
    command_name: &'static str,
    group: &'static str,
}

impl CommandConfiguration {
    pub fn of<C: Command>() -> Self {
        Self {
            command_type: TypeId::of::<C>(),
            command_name: C::NAME,
            group: C::GROUP,
        }
    }

    pub fn command_type(&self) -> TypeId {
        self.command_type
    }

    pub fn command_name(&self) -> &'static str {
        self.command_name
    }

    pub fn group(&self) -> &'static str {
        self.group
    }
}

/// 输入到命令的绑定（诊断用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub input: &'static str,
    pub command: &'static str,
}

#[derive(Debug, Clone)]
struct InputEntry {
    type_id: TypeId,
    name: &'static str,
    group: &'static str,
    declared: TypeId,
    declared_name: &'static str,
}

pub struct ConventionResolverBuilder {
    input_suffix: String,
    command_suffix: String,
    strict: bool,
    inputs: Vec<InputEntry>,
    commands: Vec<CommandConfiguration>,
}

impl Default for ConventionResolverBuilder {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ConventionResolverBuilder {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            input_suffix: config.input_suffix.clone(),
            command_suffix: config.command_suffix.clone(),
            strict: config.strict_conventions,
            inputs: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// 以配置覆盖后缀与严格模式，已登记的类型保持不变
    pub fn configure(mut self, config: &EngineConfig) -> Self {
        self.input_suffix = config.input_suffix.clone();
        self.command_suffix = config.command_suffix.clone();
        self.strict = config.strict_conventions;
        self
    }

    pub fn input_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.input_suffix = suffix.into();
        self
    }

    pub fn command_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.command_suffix = suffix.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// 登记命令类型，重复登记忽略
    pub fn command<C: Command>(mut self) -> Self {
        self.add_command::<C>();
        self
    }

    pub(crate) fn add_command<C: Command>(&mut self) {
        if !self.commands.iter().any(|c| c.command_type == TypeId::of::<C>()) {
            self.commands.push(CommandConfiguration::of::<C>());
        }
    }

    /// 登记输入类型，扫描顺序即登记顺序
    pub fn input<I: InputMessage>(mut self) -> Self {
        self.add_input::<I>();
        self
    }

    pub(crate) fn add_input<I: InputMessage>(&mut self) {
        if self.inputs.iter().any(|i| i.type_id == TypeId::of::<I>()) {
            return;
        }
        self.inputs.push(InputEntry {
            type_id: TypeId::of::<I>(),
            name: I::NAME,
            group: I::GROUP,
            declared: TypeId::of::<I::Command>(),
            declared_name: <I::Command as Command>::NAME,
        });
    }

    /// 同时登记输入及其声明的命令
    pub fn bind<I: InputMessage>(mut self) -> Self {
        self.add_command::<I::Command>();
        self.add_input::<I>();
        self
    }

    pub fn build(self) -> Result<ConventionResolver, AppError> {
        let commands: HashMap<TypeId, Arc<CommandConfiguration>> = self
            .commands
            .iter()
            .map(|c| (c.command_type, Arc::new(c.clone())))
            .collect();

        let mut inputs: HashMap<TypeId, Arc<CommandConfiguration>> = HashMap::new();
        let mut stems: HashMap<(&'static str, &str), &'static str> = HashMap::new();
        let mut bindings = Vec::new();

        for input in &self.inputs {
            let Some(stem) = strip(input.name, &self.input_suffix) else {
                self.unbound(
                    input,
                    format!("name does not end with '{}'", self.input_suffix),
                )?;
                continue;
            };

            if let Some(winner) = stems.get(&(input.group, stem)) {
                tracing::warn!(
                    input = input.name,
                    bound = *winner,
                    "input name already bound by convention; keeping the first binding"
                );
                continue;
            }

            let candidates: Vec<&CommandConfiguration> = self
                .commands
                .iter()
                .filter(|c| {
                    c.group == input.group && strip(c.command_name, &self.command_suffix) == Some(stem)
                })
                .collect();

            let matched = match candidates.as_slice() {
                [] => {
                    self.unbound(input, format!("no command named '{stem}{}'", self.command_suffix))?;
                    continue;
                }
                [only] => *only,
                many => {
                    return Err(ConfigurationError::AmbiguousBinding {
                        input: input.name,
                        candidates: many.iter().map(|c| c.command_name).collect(),
                    }
                    .into());
                }
            };

            if matched.command_type != input.declared {
                return Err(ConfigurationError::ConventionMismatch {
                    input: input.name,
                    declared: input.declared_name,
                    matched: matched.command_name,
                }
                .into());
            }

            let configuration = commands
                .get(&matched.command_type)
                .cloned()
                .unwrap_or_else(|| Arc::new(matched.clone()));
            inputs.insert(input.type_id, configuration);
            stems.insert((input.group, stem), input.name);
            bindings.push(Binding {
                input: input.name,
                command: matched.command_name,
            });
            tracing::debug!(input = input.name, command = matched.command_name, "bound by convention");
        }

        Ok(ConventionResolver {
            inputs,
            commands,
            bindings,
        })
    }

    fn unbound(&self, input: &InputEntry, reason: String) -> Result<(), AppError> {
        if self.strict {
            return Err(ConfigurationError::UnboundInput {
                input: input.name,
                reason,
            }
            .into());
        }
        tracing::warn!(input = input.name, %reason, "input left unbound");
        Ok(())
    }
}

fn strip<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    name.strip_suffix(suffix).filter(|stem| !stem.is_empty())
}

/// 冻结后的绑定表
#[derive(Debug, Default)]
pub struct ConventionResolver {
    inputs: HashMap<TypeId, Arc<CommandConfiguration>>,
    commands: HashMap<TypeId, Arc<CommandConfiguration>>,
    bindings: Vec<Binding>,
}

impl ConventionResolver {
    pub fn builder() -> ConventionResolverBuilder {
        ConventionResolverBuilder::default()
    }

    /// 输入适用的命令配置；未绑定时为空
    pub fn applicable_commands<I: InputMessage>(&self) -> Vec<Arc<CommandConfiguration>> {
        self.inputs
            .get(&TypeId::of::<I>())
            .cloned()
            .into_iter()
            .collect()
    }

    /// 命令自身的配置
    pub fn configuration_for<C: Command>(&self) -> Result<Arc<CommandConfiguration>, AppError> {
        self.commands
            .get(&TypeId::of::<C>())
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownCommand(C::NAME).into())
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_macros::{Command, InputMessage};

    #[derive(Command)]
    struct UpdateEmployeeCommand;

    #[derive(InputMessage)]
    #[input(command = UpdateEmployeeCommand)]
    struct UpdateEmployeeInput;

    #[derive(InputMessage)]
    #[input(name = "UpdateEmployeeInput", command = UpdateEmployeeCommand)]
    struct LegacyUpdateEmployeeInput;

    #[derive(Command)]
    struct DeleteEmployeeCommand;

    #[derive(InputMessage)]
    #[input(command = DeleteEmployeeCommand)]
    struct DeleteEmployeeForm;

    #[derive(InputMessage)]
    #[input(command = DeleteEmployeeCommand)]
    struct UpdateTeamInput;

    #[derive(Command)]
    #[command(group = "loans")]
    struct ReturnItemCommand;

    #[derive(Command)]
    #[command(group = "loans", name = "ReturnItemCmd")]
    struct ReturnItemV2Command;

    #[derive(InputMessage)]
    #[input(group = "loans", command = ReturnItemCommand)]
    struct ReturnItemInput;

    #[derive(InputMessage)]
    #[input(command = ReturnItemCommand)]
    struct ReturnItemOutsideGroupInput;

    #[test]
    fn binds_by_stripped_name() {
        let resolver = ConventionResolver::builder()
            .bind::<UpdateEmployeeInput>()
            .command::<DeleteEmployeeCommand>()
            .build()
            .unwrap();

        let configs = resolver.applicable_commands::<UpdateEmployeeInput>();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].command_name(), "UpdateEmployeeCommand");
        assert_eq!(
            resolver.bindings(),
            &[Binding {
                input: "UpdateEmployeeInput",
                command: "UpdateEmployeeCommand"
            }]
        );
        // 命令自身的配置
        assert_eq!(
            resolver
                .configuration_for::<DeleteEmployeeCommand>()
                .unwrap()
                .command_type(),
            TypeId::of::<DeleteEmployeeCommand>()
        );
    }

    #[test]
    fn colliding_input_names_keep_first() {
        let resolver = ConventionResolver::builder()
            .bind::<UpdateEmployeeInput>()
            .input::<LegacyUpdateEmployeeInput>()
            .build()
            .unwrap();
        assert_eq!(resolver.applicable_commands::<UpdateEmployeeInput>().len(), 1);
        assert!(resolver
            .applicable_commands::<LegacyUpdateEmployeeInput>()
            .is_empty());
        assert_eq!(resolver.bindings().len(), 1);
    }

    #[test]
    fn strict_mode_rejects_unsuffixed_input() {
        let err = ConventionResolver::builder()
            .bind::<DeleteEmployeeForm>()
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Configuration(ConfigurationError::UnboundInput {
                input: "DeleteEmployeeForm",
                ..
            })
        ));
    }

    #[test]
    fn lenient_mode_skips_unbound_input() {
        let resolver = ConventionResolver::builder()
            .strict(false)
            .bind::<DeleteEmployeeForm>()
            .bind::<UpdateEmployeeInput>()
            .build()
            .unwrap();
        assert!(resolver.applicable_commands::<DeleteEmployeeForm>().is_empty());
        assert_eq!(resolver.applicable_commands::<UpdateEmployeeInput>().len(), 1);
    }

    #[test]
    fn custom_suffix_binds_forms() {
        let resolver = ConventionResolver::builder()
            .input_suffix("Form")
            .bind::<DeleteEmployeeForm>()
            .build()
            .unwrap();
        assert_eq!(resolver.applicable_commands::<DeleteEmployeeForm>().len(), 1);
    }

    #[test]
    fn convention_must_agree_with_declaration() {
        let err = ConventionResolver::builder()
            .command::<UpdateEmployeeCommand>()
            .command::<DeleteEmployeeCommand>()
            .input::<UpdateTeamInput>()
            .build()
            .unwrap_err();
        // UpdateTeam 无同名命令
        assert!(err.is_configuration());

        #[derive(Command)]
        struct UpdateTeamCommand;
        let err = ConventionResolver::builder()
            .command::<UpdateTeamCommand>()
            .bind::<UpdateTeamInput>()
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Configuration(ConfigurationError::ConventionMismatch {
                input: "UpdateTeamInput",
                declared: "DeleteEmployeeCommand",
                matched: "UpdateTeamCommand",
            })
        ));
    }

    #[test]
    fn groups_isolate_matches() {
        let resolver = ConventionResolver::builder()
            .bind::<ReturnItemInput>()
            .build()
            .unwrap();
        assert_eq!(resolver.applicable_commands::<ReturnItemInput>().len(), 1);

        let err = ConventionResolver::builder()
            .bind::<ReturnItemOutsideGroupInput>()
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Configuration(ConfigurationError::UnboundInput { .. })
        ));
    }

    #[test]
    fn empty_command_suffix_leaves_input_unbound() {
        // 空命令后缀下 "ReturnItemCommand" 与 "ReturnItemCmd" 均不等于 "ReturnItem"
        let err = ConventionResolver::builder()
            .command::<ReturnItemV2Command>()
            .command_suffix("")
            .bind::<ReturnItemInput>()
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Configuration(ConfigurationError::UnboundInput {
                input: "ReturnItemInput",
                ..
            })
        ));
    }

    #[test]
    fn ambiguous_commands_are_rejected() {
        #[derive(Command)]
        #[command(group = "loans", name = "ReturnItemCommand")]
        struct ShadowReturnItemCommand;
        let err = ConventionResolver::builder()
            .command::<ShadowReturnItemCommand>()
            .bind::<ReturnItemInput>()
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Configuration(ConfigurationError::AmbiguousBinding { .. })
        ));
    }

    #[test]
    fn unknown_command_configuration() {
        let resolver = ConventionResolver::builder().build().unwrap();
        let err = resolver.configuration_for::<UpdateEmployeeCommand>().unwrap_err();
        assert!(matches!(
            err,
            AppError::Configuration(ConfigurationError::UnknownCommand("UpdateEmployeeCommand"))
        ));
    }
}
