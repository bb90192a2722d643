use rules_domain::error::DomainError;

/// 配置错误：启动期或首次使用时暴露，不可在请求范围内恢复
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("handler registry queried before configuration")]
    RegistryNotConfigured,

    #[error("handler registry already configured")]
    AlreadyConfigured,

    #[error("input has no bound command: input={input}, reason={reason}")]
    UnboundInput { input: &'static str, reason: String },

    #[error("ambiguous convention binding: input={input}, candidates={candidates:?}")]
    AmbiguousBinding {
        input: &'static str,
        candidates: Vec<&'static str>,
    },

    #[error("convention mismatch: input={input}, declared={declared}, matched={matched}")]
    ConventionMismatch {
        input: &'static str,
        declared: &'static str,
        matched: &'static str,
    },

    #[error("command not configured: {0}")]
    UnknownCommand(&'static str),

    #[error("missing mapping: from={from}, to={to}")]
    MissingMapping {
        from: &'static str,
        to: &'static str,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("rejected: {0}")]
    Rejected(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("execution failed: command={command}, handler={handler}: {source}")]
    Execution {
        command: &'static str,
        handler: &'static str,
        #[source]
        source: Box<AppError>,
    },

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("transaction state: {0}")]
    TransactionState(&'static str),

    #[error("cancelled")]
    Cancelled,

    #[error("timed out")]
    Timeout,

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl AppError {
    /// 是否为配置错误（含被包装在执行错误中的配置错误）
    pub fn is_configuration(&self) -> bool {
        match self {
            AppError::Configuration(_) => true,
            AppError::Execution { source, .. } => source.is_configuration(),
            _ => false,
        }
    }

    /// 是否为分发阶段的执行失败
    pub fn is_execution(&self) -> bool {
        matches!(self, AppError::Execution { .. })
    }
}
