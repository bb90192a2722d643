use crate::{
    command::{Command, InputMessage},
    command_handler::{CommandAction, CommandHandler},
    config::EngineConfig,
    context::AppContext,
    convention::{ConventionResolver, ConventionResolverBuilder},
    error::AppError,
    mapping::{Mapper, MapperBuilder},
    outcome::Outcome,
    processor::MessageProcessor,
    registry::{HandlerRegistrations, HandlerRegistry},
    validation::{Validator, ValidatorSet, ValidatorSetBuilder},
};
use async_trait::async_trait;
use rules_domain::persist::SessionFactory;
use std::sync::Arc;

/// 规则引擎（Rules Engine）
///
/// - 唯一入口：输入或命令进，`Outcome` 出；
/// - 校验失败体现在 `Outcome` 中；配置错误、执行错误、取消与超时以 `Err` 返回；
/// - 配置构建后只读，可被并发调用。
#[async_trait]
pub trait RulesEngine: Send + Sync {
    /// 处理入站输入：按约定绑定到命令后执行
    async fn process<I>(
        &self,
        ctx: &AppContext,
        input: I,
    ) -> Result<Outcome<<I::Command as Command>::Result>, AppError>
    where
        I: InputMessage;

    /// 直接处理命令消息
    async fn execute<C>(&self, ctx: &AppContext, command: C) -> Result<Outcome<C::Result>, AppError>
    where
        C: Command;
}

/// 进程内规则引擎
pub struct InProcessRulesEngine<F: SessionFactory> {
    processor: MessageProcessor<F>,
}

impl<F: SessionFactory> InProcessRulesEngine<F> {
    pub fn new(processor: MessageProcessor<F>) -> Self {
        Self { processor }
    }

    pub fn builder(sessions: F) -> RulesEngineBuilder<F> {
        RulesEngineBuilder::new(sessions)
    }

    pub fn processor(&self) -> &MessageProcessor<F> {
        &self.processor
    }

    pub fn conventions(&self) -> &ConventionResolver {
        self.processor.conventions()
    }
}

#[async_trait]
impl<F: SessionFactory> RulesEngine for InProcessRulesEngine<F> {
    async fn process<I>(
        &self,
        ctx: &AppContext,
        input: I,
    ) -> Result<Outcome<<I::Command as Command>::Result>, AppError>
    where
        I: InputMessage,
    {
        self.processor.process(ctx, input).await.map(Outcome::from)
    }

    async fn execute<C>(&self, ctx: &AppContext, command: C) -> Result<Outcome<C::Result>, AppError>
    where
        C: Command,
    {
        self.processor.execute(ctx, command).await.map(Outcome::from)
    }
}

/// 组合根：登记输入、命令、处理器、校验规则与映射，最后一次性冻结
///
/// ```no_run
/// # use rules_application::engine::InProcessRulesEngine;
/// # use rules_domain::persist::InMemoryDatabase;
/// # fn main() -> Result<(), rules_application::error::AppError> {
/// let engine = InProcessRulesEngine::builder(InMemoryDatabase::new())
///     // .bind::<UpdateEmployeeInput>()
///     // .handler::<UpdateEmployeeCommand, _>(Arc::new(UpdateEmployee))
///     .build()?;
/// # let _ = engine;
/// # Ok(())
/// # }
/// ```
pub struct RulesEngineBuilder<F: SessionFactory> {
    sessions: F,
    config: EngineConfig,
    conventions: ConventionResolverBuilder,
    registrations: HandlerRegistrations<F::Session>,
    registry: Option<Arc<HandlerRegistry<F::Session>>>,
    validators: ValidatorSetBuilder,
    mapper: MapperBuilder,
}

impl<F: SessionFactory> RulesEngineBuilder<F> {
    pub fn new(sessions: F) -> Self {
        Self {
            sessions,
            config: EngineConfig::default(),
            conventions: ConventionResolverBuilder::default(),
            registrations: HandlerRegistrations::new(),
            registry: None,
            validators: ValidatorSet::builder(),
            mapper: Mapper::builder(),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 登记输入及其声明的命令
    pub fn bind<I: InputMessage>(mut self) -> Self {
        self.conventions = self.conventions.bind::<I>();
        self
    }

    /// 仅登记输入（其命令须另行登记）
    pub fn input<I: InputMessage>(mut self) -> Self {
        self.conventions = self.conventions.input::<I>();
        self
    }

    pub fn command<C: Command>(mut self) -> Self {
        self.conventions = self.conventions.command::<C>();
        self
    }

    /// 注册处理器，并将其命令登记到约定解析器
    pub fn handler<C, H>(mut self, handler: Arc<H>) -> Self
    where
        C: Command,
        H: CommandHandler<C, F::Session> + 'static,
    {
        self.registrations.handler::<C, H>(handler);
        self.conventions = self.conventions.command::<C>();
        self
    }

    pub fn action<C, A>(mut self, action: Arc<A>) -> Self
    where
        C: Command,
        A: CommandAction<C, F::Session> + 'static,
    {
        self.registrations.action::<C, A>(action);
        self.conventions = self.conventions.command::<C>();
        self
    }

    /// 使用外部注册表；构建时若有本地注册的处理器则用其配置该注册表
    pub fn registry(mut self, registry: Arc<HandlerRegistry<F::Session>>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn validator<C: Command>(mut self, validator: Validator<C>) -> Self {
        self.validators = self.validators.add(validator);
        self
    }

    pub fn map<S, D, M>(mut self, f: M) -> Self
    where
        S: Send + 'static,
        D: Send + 'static,
        M: Fn(S) -> D + Send + Sync + 'static,
    {
        self.mapper = self.mapper.register(f);
        self
    }

    pub fn try_map<S, D, M>(mut self, f: M) -> Self
    where
        S: Send + 'static,
        D: Send + 'static,
        M: Fn(S) -> Result<D, AppError> + Send + Sync + 'static,
    {
        self.mapper = self.mapper.try_register(f);
        self
    }

    pub fn map_from<S, D>(mut self) -> Self
    where
        S: Send + 'static,
        D: From<S> + Send + 'static,
    {
        self.mapper = self.mapper.register_from::<S, D>();
        self
    }

    pub fn build(self) -> Result<InProcessRulesEngine<F>, AppError> {
        let conventions = self.conventions.configure(&self.config).build()?;

        let registry = match self.registry {
            Some(registry) => {
                if !self.registrations.is_empty() {
                    registry.configure(self.registrations)?;
                }
                registry
            }
            None => Arc::new(HandlerRegistry::with_registrations(self.registrations)),
        };

        tracing::info!(
            bindings = conventions.bindings().len(),
            strict = self.config.strict_conventions,
            "rules engine configured"
        );

        let processor = MessageProcessor::new(
            self.sessions,
            Arc::new(conventions),
            registry,
            Arc::new(self.validators.build()),
            Arc::new(self.mapper.build()),
        )
        .with_handler_timeout(self.config.handler_timeout());

        Ok(InProcessRulesEngine::new(processor))
    }
}
