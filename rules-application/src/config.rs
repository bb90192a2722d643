//! 引擎配置
//!
//! 来源优先级：环境变量 > TOML 文件 > 默认值。

use crate::error::{AppError, ConfigurationError};
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_INPUT_SUFFIX: &str = "RULES_INPUT_SUFFIX";
pub const ENV_COMMAND_SUFFIX: &str = "RULES_COMMAND_SUFFIX";
pub const ENV_STRICT_CONVENTIONS: &str = "RULES_STRICT_CONVENTIONS";
pub const ENV_HANDLER_TIMEOUT_MS: &str = "RULES_HANDLER_TIMEOUT_MS";

const DEFAULT_INPUT_SUFFIX: &str = "Input";
const DEFAULT_COMMAND_SUFFIX: &str = "Command";

/// 引擎配置
///
/// ```
/// use rules_application::config::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .input_suffix("Form")
///     .strict_conventions(false)
///     .build();
/// assert_eq!(config.command_suffix, "Command");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct EngineConfig {
    /// 输入类型名称的约定后缀
    #[builder(default = DEFAULT_INPUT_SUFFIX.to_string(), into)]
    pub input_suffix: String,
    /// 命令类型名称的约定后缀
    #[builder(default = DEFAULT_COMMAND_SUFFIX.to_string(), into)]
    pub command_suffix: String,
    /// 严格模式下未绑定的输入在启动期即报错；宽松模式仅告警
    #[builder(default = true)]
    pub strict_conventions: bool,
    /// 单个处理器的执行时限（毫秒）
    pub handler_timeout_ms: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            input_suffix: DEFAULT_INPUT_SUFFIX.to_string(),
            command_suffix: DEFAULT_COMMAND_SUFFIX.to_string(),
            strict_conventions: true,
            handler_timeout_ms: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, AppError> {
        toml::from_str(raw).map_err(|e| ConfigurationError::Invalid(e.to_string()).into())
    }

    /// 读取 TOML 文件并叠加环境变量覆盖
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::Invalid(format!("read {}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// 默认值叠加环境变量覆盖
    pub fn from_env() -> Result<Self, AppError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), AppError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// 以任意键值来源覆盖配置
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_INPUT_SUFFIX) {
            self.input_suffix = v;
        }
        if let Some(v) = lookup(ENV_COMMAND_SUFFIX) {
            self.command_suffix = v;
        }
        if let Some(v) = lookup(ENV_STRICT_CONVENTIONS) {
            self.strict_conventions = parse_bool(ENV_STRICT_CONVENTIONS, &v)?;
        }
        if let Some(v) = lookup(ENV_HANDLER_TIMEOUT_MS) {
            let ms = v.trim().parse::<u64>().map_err(|e| {
                ConfigurationError::Invalid(format!("{ENV_HANDLER_TIMEOUT_MS}={v}: {e}"))
            })?;
            self.handler_timeout_ms = Some(ms);
        }
        Ok(())
    }

    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_ms.map(Duration::from_millis)
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigurationError::Invalid(format!("{key}={raw}: expected a boolean")).into()),
    }
}
