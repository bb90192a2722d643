//! 日志初始化
//!
//! 进程级一次性安装 `tracing` 订阅者；引擎内部只发出事件与 span，不主动安装订阅者。

use std::sync::Once;
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

/// 日志输出档位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// 人类可读输出，默认 debug 级别
    Development,
    /// JSON 结构化输出，默认 info 级别
    Production,
    /// 测试：仅安装空注册表
    Test,
}

static INIT_ONCE: Once = Once::new();

const DEV_FILTER: &str = "rules_application=debug,rules_domain=debug";
const PROD_FILTER: &str = "rules_application=info,rules_domain=info";

/// 安装全局订阅者，多次调用只有第一次生效
///
/// `RUST_LOG` 存在时优先使用其过滤规则。若宿主已安装其他订阅者，本调用静默跳过。
///
/// ```
/// use rules_application::logging::{init, Profile};
///
/// init(Profile::Test);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| {
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(env_filter(DEV_FILTER))
                .finish()
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter(PROD_FILTER))
                .finish()
                .try_init(),
            Profile::Test => tracing_subscriber::registry().try_init(),
        };
        if installed.is_err() {
            tracing::debug!(?profile, "global subscriber already installed");
        }
    });
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
