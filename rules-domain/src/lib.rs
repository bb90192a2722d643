//! 业务规则领域层基础库（rules-domain）
//!
//! 为命令处理引擎提供与具体基础设施解耦的领域协议：
//! - 实体（`entity`）：带唯一标识的可持久化对象；
//! - 规约（`specification`）：可组合的业务谓词，亦用作校验规则的判定部分；
//! - 业务语境（`business_context`）：关联追踪与执行主体；
//! - 持久化会话（`persist`）：事务边界所需的最小会话协议及内存实现；
//! - 统一错误（`error`）。
//!
//! 应用层（`rules-application`）在此之上编排“映射 → 校验 → 分发 → 提交”的完整流程。
//!
pub mod business_context;
pub mod entity;
pub mod error;
pub mod persist;
pub mod specification;

// 允许在本 crate 内部通过 ::rules_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::rules_domain 路径。
extern crate self as rules_domain;
