use crate::{
    command::Command, context::AppContext, error::AppError, outcome::ReturnItem,
    registry::HandlerFn,
};
use rules_domain::persist::Session;
use std::any::TypeId;

/// 处理器返回的结果及其运行时类型
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnValue<R> {
    pub slot: TypeId,
    pub type_name: &'static str,
    pub value: R,
}

/// 处理器调用代理
///
/// 无论底层是 `CommandHandler` 还是 `CommandAction`，均以统一形状执行；
/// 处理器错误原样返回，由调用方决定回滚。
pub struct HandlerProxy<C: Command, S> {
    name: &'static str,
    invoke: HandlerFn<C, S>,
}

impl<C: Command, S: Session> HandlerProxy<C, S> {
    pub(crate) fn new(name: &'static str, invoke: HandlerFn<C, S>) -> Self {
        Self { name, invoke }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn execute(
        &self,
        ctx: &AppContext,
        session: &mut S,
        cmd: &C,
    ) -> Result<Option<ReturnValue<C::Result>>, AppError> {
        let out = (self.invoke)(ctx, session, cmd).await?;
        Ok(out.map(|value| ReturnValue {
            slot: value.slot(),
            type_name: value.type_name(),
            value,
        }))
    }
}

impl<C: Command, S> Clone for HandlerProxy<C, S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            invoke: self.invoke.clone(),
        }
    }
}

impl<C: Command, S> std::fmt::Debug for HandlerProxy<C, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerProxy")
            .field("name", &self.name)
            .field("command", &C::NAME)
            .finish()
    }
}
