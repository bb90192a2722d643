use crate::{
    command::Command,
    convention::CommandConfiguration,
    error::AppError,
    proxy::HandlerProxy,
    registry::HandlerRegistry,
};
use rules_domain::persist::Session;
use std::any::TypeId;

/// 命令定位器：按命令配置查询注册表并包装为调用代理
pub struct CommandLocator<'r, S> {
    registry: &'r HandlerRegistry<S>,
}

impl<'r, S: Session> CommandLocator<'r, S> {
    pub fn new(registry: &'r HandlerRegistry<S>) -> Self {
        Self { registry }
    }

    /// 返回命令的全部处理器代理，顺序与注册顺序一致
    pub fn commands<C: Command>(
        &self,
        configuration: &CommandConfiguration,
    ) -> Result<Vec<HandlerProxy<C, S>>, AppError> {
        if configuration.command_type() != TypeId::of::<C>() {
            return Err(AppError::TypeMismatch {
                expected: configuration.command_name(),
                found: C::NAME,
            });
        }

        self.registry
            .locate::<C>()?
            .iter()
            .map(|d| {
                d.invoker::<C, S>()
                    .map(|f| HandlerProxy::new(d.name(), f.clone()))
                    .ok_or(AppError::TypeMismatch {
                        expected: C::NAME,
                        found: d.command(),
                    })
            })
            .collect()
    }
}
