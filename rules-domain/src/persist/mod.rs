//! 持久化会话（persist）
//!
//! 定义事务边界所依赖的最小会话协议：
//! - `SessionFactory`：按调用打开一个新的会话；
//! - `Session`：开始/提交/回滚事务并在结束时释放底层资源。
//!
//! 具体存储后端（如关系型数据库）由上层提供实现并注入；
//! `inmemory` 特性提供基于内存的参考实现，便于测试与示例。
//!
mod session;

#[cfg(feature = "inmemory")]
mod inmemory;

pub use session::{Session, SessionFactory};

#[cfg(feature = "inmemory")]
pub use inmemory::{InMemoryDatabase, InMemorySession, TransactionStats};
