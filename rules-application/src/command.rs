use crate::outcome::ReturnItem;

/// 未显式声明分组时使用的约定分组
pub const DEFAULT_GROUP: &str = "default";

/// 应用层命令（Command）
///
/// 表达“意图”的写操作请求，通常会修改领域状态。
/// - 建议保持语义化命名，并以统一后缀结尾，如 `UpdateEmployeeCommand`；
/// - `Result` 为该命令声明的结果形状（和类型），处理器只能返回其中的变体，
///   调用方按类型读取结果时可在编译期检查。
///
/// 关联常量：
/// - `NAME`：命令的稳定名称，用于约定绑定、日志与追踪。避免依赖 `type_name::<T>()`。
/// - `GROUP`：约定分组，仅同组的输入与命令才会互相匹配。
pub trait Command: Send + Sync + 'static {
    /// 命令的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    const GROUP: &'static str = DEFAULT_GROUP;

    /// 处理器可返回的结果形状
    type Result: ReturnItem;
}

/// 入站输入消息（Input）
///
/// 面向界面的载荷形状，按命名约定绑定到一个命令类型；
/// `Command` 为静态声明的绑定目标，约定解析器在启动时校验二者一致。
pub trait InputMessage: Send + Sync + 'static {
    /// 输入的稳定名称，如 `UpdateEmployeeInput`
    const NAME: &'static str;

    const GROUP: &'static str = DEFAULT_GROUP;

    /// 绑定的命令类型
    type Command: Command;
}
