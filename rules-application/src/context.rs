use rules_domain::business_context::BusinessContext;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// 应用层上下文（Application Context）
///
/// 承载一次消息处理所需的横切信息，例如：
/// - 业务语境（`BusinessContext`）：关联追踪 `correlation_id`、因果链 `causation_id`、
///   执行者类型/ID 等；
/// - 幂等键（`idempotency_key`）：用于在基础设施层实现请求幂等；
/// - 取消令牌与截止时间：处理器与提交阶段会与之竞速，超时或取消即回滚。
///
/// 典型用法：
/// ```rust
/// use rules_application::context::AppContext;
/// use rules_domain::business_context::BusinessContext;
/// use std::time::Duration;
///
/// let ctx = AppContext {
///     biz: BusinessContext::builder()
///         .maybe_correlation_id(Some("cor-123".into()))
///         .maybe_actor_type(Some("user".into()))
///         .maybe_actor_id(Some("u-1".into()))
///         .build(),
///     idempotency_key: Some("idem-xyz".into()),
///     ..Default::default()
/// }
/// .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    /// 业务语境（链路追踪、审计主体、操作因果）
    pub biz: BusinessContext,
    /// 幂等键（可选）：为空则由上层或基础设施决定是否参与幂等
    pub idempotency_key: Option<String>,
    /// 取消令牌：由调用方持有并在需要时取消
    pub cancellation: CancellationToken,
    /// 截止时间（可选）
    pub deadline: Option<Instant>,
}

impl AppContext {
    /// 设置相对当前时刻的截止时间
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// 截止时间是否已过
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|at| at <= Instant::now())
    }
}
