//! 消息处理器
//!
//! 单条消息的处理流程：
//! 1. MAP：按约定解析命令配置，并把输入映射为命令；
//! 2. VALIDATE：存在失败即返回校验结果，不打开会话；
//! 3. BEGIN：打开会话并开启事务；
//! 4. DISPATCH：按注册顺序执行全部处理器，任一失败即回滚；
//! 5. COMMIT：提交失败同样先回滚再返回错误。
//!
//! BEGIN 之后的所有路径都会释放会话。处理器与提交都会与取消令牌、截止时间竞速；
//! 调用进入时已取消或已超时则不打开会话。处理器 panic 按执行失败处理并回滚。

use crate::{
    command::{Command, InputMessage},
    context::AppContext,
    convention::{CommandConfiguration, ConventionResolver},
    error::{AppError, ConfigurationError},
    locator::CommandLocator,
    mapping::Mapper,
    outcome::{ExecutionResult, ReturnItems},
    proxy::HandlerProxy,
    registry::HandlerRegistry,
    unit_of_work::UnitOfWork,
    validation::ValidatorSet,
};
use futures_util::FutureExt;
use rules_domain::persist::SessionFactory;
use std::any::{Any, TypeId};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub struct MessageProcessor<F: SessionFactory> {
    sessions: F,
    conventions: Arc<ConventionResolver>,
    registry: Arc<HandlerRegistry<F::Session>>,
    validators: Arc<ValidatorSet>,
    mapper: Arc<Mapper>,
    handler_timeout: Option<Duration>,
}

impl<F: SessionFactory> MessageProcessor<F> {
    pub fn new(
        sessions: F,
        conventions: Arc<ConventionResolver>,
        registry: Arc<HandlerRegistry<F::Session>>,
        validators: Arc<ValidatorSet>,
        mapper: Arc<Mapper>,
    ) -> Self {
        Self {
            sessions,
            conventions,
            registry,
            validators,
            mapper,
            handler_timeout: None,
        }
    }

    /// 单个处理器的执行时限，与调用方的截止时间取较早者
    pub fn with_handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn conventions(&self) -> &ConventionResolver {
        &self.conventions
    }

    pub fn registry(&self) -> &HandlerRegistry<F::Session> {
        &self.registry
    }

    /// 处理入站输入
    pub async fn process<I: InputMessage>(
        &self,
        ctx: &AppContext,
        input: I,
    ) -> Result<ExecutionResult<<I::Command as Command>::Result>, AppError> {
        let configuration = self
            .conventions
            .applicable_commands::<I>()
            .into_iter()
            .find(|c| c.command_type() == TypeId::of::<I::Command>())
            .ok_or_else(|| ConfigurationError::UnboundInput {
                input: I::NAME,
                reason: "no convention binding".to_string(),
            })?;

        let command = self.mapper.map::<I, I::Command>(input)?;
        tracing::debug!(input = I::NAME, command = <I::Command as Command>::NAME, "mapped");
        self.run(ctx, &configuration, command).await
    }

    /// 直接处理命令消息
    pub async fn execute<C: Command>(
        &self,
        ctx: &AppContext,
        command: C,
    ) -> Result<ExecutionResult<C::Result>, AppError> {
        let configuration = self.conventions.configuration_for::<C>()?;
        self.run(ctx, &configuration, command).await
    }

    #[tracing::instrument(
        name = "process",
        skip_all,
        fields(
            command = C::NAME,
            correlation_id = ctx.biz.correlation_id().unwrap_or_default()
        )
    )]
    async fn run<C: Command>(
        &self,
        ctx: &AppContext,
        configuration: &CommandConfiguration,
        command: C,
    ) -> Result<ExecutionResult<C::Result>, AppError> {
        let errors = self.validators.validate(&command);
        if !errors.is_empty() {
            tracing::debug!(failures = errors.len(), "validation failed");
            return Ok(ExecutionResult::failed_validation(errors));
        }

        let proxies = CommandLocator::new(&self.registry).commands::<C>(configuration)?;

        if ctx.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        if ctx.is_expired() {
            return Err(AppError::Timeout);
        }

        let session = self.sessions.open().await?;
        let mut uow = UnitOfWork::new(session);
        let dispatched = self.dispatch(ctx, &mut uow, &proxies, &command).await;

        if let Err(e) = uow.dispose().await {
            tracing::warn!(error = %e, "session dispose failed");
        }

        let items = dispatched?;
        tracing::debug!(results = items.len(), "committed");
        Ok(ExecutionResult::succeeded(items))
    }

    async fn dispatch<C: Command>(
        &self,
        ctx: &AppContext,
        uow: &mut UnitOfWork<F::Session>,
        proxies: &[HandlerProxy<C, F::Session>],
        command: &C,
    ) -> Result<ReturnItems<C::Result>, AppError> {
        uow.begin().await?;
        tracing::debug!(handlers = proxies.len(), "transaction begun");

        let mut items = ReturnItems::new();
        for proxy in proxies {
            let deadline = self.handler_deadline(ctx);
            let executed = match uow.session_mut() {
                Ok(session) => {
                    let call = AssertUnwindSafe(proxy.execute(ctx, session, command))
                        .catch_unwind()
                        .map(|caught| {
                            caught.unwrap_or_else(|panic| {
                                Err(AppError::Panicked(panic_message(panic.as_ref())))
                            })
                        });
                    guarded(ctx, deadline, call).await
                }
                Err(e) => Err(e),
            };

            match executed {
                Ok(Some(returned)) => {
                    if items.insert(returned.value).is_some() {
                        tracing::debug!(
                            result = returned.type_name,
                            handler = proxy.name(),
                            "result replaced by a later handler"
                        );
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    roll_back(uow, &e).await;
                    return Err(match e {
                        AppError::Cancelled | AppError::Timeout => e,
                        other => AppError::Execution {
                            command: C::NAME,
                            handler: proxy.name(),
                            source: Box::new(other),
                        },
                    });
                }
            }
        }

        if let Err(e) = guarded(ctx, ctx.deadline, uow.commit()).await {
            roll_back(uow, &e).await;
            return Err(e);
        }
        Ok(items)
    }

    fn handler_deadline(&self, ctx: &AppContext) -> Option<Instant> {
        let local = self.handler_timeout.map(|t| Instant::now() + t);
        match (ctx.deadline, local) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

async fn roll_back<S: rules_domain::persist::Session>(uow: &mut UnitOfWork<S>, cause: &AppError) {
    tracing::error!(error = %cause, "rolling back");
    if let Err(e) = uow.rollback().await {
        tracing::error!(error = %e, "rollback failed");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// 与取消令牌、截止时间竞速
async fn guarded<T, Fut>(
    ctx: &AppContext,
    deadline: Option<Instant>,
    fut: Fut,
) -> Result<T, AppError>
where
    Fut: Future<Output = Result<T, AppError>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancellation.cancelled() => Err(AppError::Cancelled),
        _ = sleep_until(deadline) => Err(AppError::Timeout),
        out = fut => out,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
