use crate::{command::Command, context::AppContext, error::AppError};
use async_trait::async_trait;
use rules_domain::persist::Session;

/// 命令处理器：在引擎开启的事务内执行业务逻辑，可返回一个结果
///
/// `session` 即本次处理的事务上下文，同一消息的所有处理器共享同一个会话。
#[async_trait]
pub trait CommandHandler<C, S>: Send + Sync
where
    C: Command,
    S: Session,
{
    async fn handle(
        &self,
        ctx: &AppContext,
        session: &mut S,
        cmd: &C,
    ) -> Result<Option<C::Result>, AppError>;
}

/// 不产生结果的处理器
#[async_trait]
pub trait CommandAction<C, S>: Send + Sync
where
    C: Command,
    S: Session,
{
    async fn run(&self, ctx: &AppContext, session: &mut S, cmd: &C) -> Result<(), AppError>;
}
