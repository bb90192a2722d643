//! 业务规则引擎过程宏（rules-macros）
//!
//! - `#[entity]`：为结构体补齐 `id` 字段并实现 `::rules_domain::entity::Entity`；
//! - `#[derive(Command)]`：实现 `::rules_application::command::Command`；
//! - `#[derive(InputMessage)]`：实现 `::rules_application::command::InputMessage`，静态声明绑定的命令；
//! - `#[derive(ReturnItem)]`：为结果枚举/结构体实现 `ReturnItem` 与按类型提取的 `Extract<T>`。
//!
use proc_macro::TokenStream;

mod attr_utils;
mod command;
mod derive_utils;
mod entity;
mod field_utils;
mod return_item;

/// 实体宏
/// - 若缺失则追加字段 `id: IdType` 并置于字段最前
/// - 合并派生：Debug（可关闭）、Clone、Default、Serialize、Deserialize
/// - 支持参数：`#[entity(id = IdType, name = "Name", debug = true|false)]`
///   - `id` 默认 `String`
///   - `name` 默认结构体名
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item)
}

/// 命令派生宏
///
/// `#[command(result = Ty, name = "...", group = "...")]`，均为可选：
/// - `result` 默认 `()`
/// - `name` 默认类型名
#[proc_macro_derive(Command, attributes(command))]
pub fn derive_command(item: TokenStream) -> TokenStream {
    command::expand_command(item)
}

/// 输入消息派生宏
///
/// `#[input(command = Ty, name = "...", group = "...")]`，其中 `command` 必填。
#[proc_macro_derive(InputMessage, attributes(input))]
pub fn derive_input_message(item: TokenStream) -> TokenStream {
    command::expand_input(item)
}

/// 结果项派生宏
///
/// - 枚举：每个变体须为单字段元组变体，如 `Employee(Employee)`；
///   为每个内部类型生成 `Extract<Inner>` 与 `From<Inner>`
/// - 结构体：自身即唯一结果类型
#[proc_macro_derive(ReturnItem)]
pub fn derive_return_item(item: TokenStream) -> TokenStream {
    return_item::expand(item)
}
