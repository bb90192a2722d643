//! 实体（Entity）基础抽象
//!
//! 为可持久化的业务对象提供统一的类型名与唯一标识（Id）。
//!
use std::{fmt::Display, str::FromStr};

/// 具备唯一标识的实体抽象
pub trait Entity: Send + Sync {
    /// 实体类型名（用于存储键、日志与投影），建议保持稳定
    const TYPE: &'static str;

    /// 实体标识类型，要求可解析、可显示与可克隆
    type Id: FromStr + Clone + Display + Send + Sync;

    /// 使用给定标识创建实体
    fn new(id: Self::Id) -> Self;

    /// 获取实体标识
    fn id(&self) -> &Self::Id;
}
