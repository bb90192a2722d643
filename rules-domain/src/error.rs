//! 领域层统一错误定义
//!
//! 聚焦序列化、持久化会话、实体与状态校验等最小必要集合，
//! 便于在应用层统一转换为 `AppError`。
//!
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
    #[error("parse error: {reason}")]
    Parse { reason: String },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch { expected: String, found: String },

    // --- 持久化/会话 ---
    #[error("session error: {reason}")]
    Session { reason: String },
    #[error("database error: {reason}")]
    Database { reason: String },

    // --- 领域规则/状态 ---
    #[error("invalid command: {reason}")]
    InvalidCommand { reason: String },
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },
    #[error("not found: {reason}")]
    NotFound { reason: String },
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn session(reason: impl Into<String>) -> Self {
        DomainError::Session {
            reason: reason.into(),
        }
    }

    pub fn database(reason: impl Into<String>) -> Self {
        DomainError::Database {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        DomainError::InvalidState {
            reason: reason.into(),
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        DomainError::NotFound {
            reason: reason.into(),
        }
    }
}

impl From<std::num::ParseIntError> for DomainError {
    fn from(err: std::num::ParseIntError) -> Self {
        DomainError::Parse {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_error_maps_to_parse() {
        let err: DomainError = "x1".parse::<u64>().unwrap_err().into();
        assert!(matches!(err, DomainError::Parse { .. }));
    }

    #[test]
    fn helpers_render_reason() {
        assert_eq!(
            DomainError::invalid_state("no active transaction").to_string(),
            "invalid state: no active transaction"
        );
        assert_eq!(
            DomainError::not_found("Employee:5").to_string(),
            "not found: Employee:5"
        );
    }
}
