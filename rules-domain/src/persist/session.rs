use crate::error::DomainResult;
use async_trait::async_trait;
use std::sync::Arc;

/// 一次调用范围内的持久化会话
///
/// 事务状态由会话自身维护；幂等开始、无事务时回滚为空操作等语义
/// 由应用层的工作单元（Unit of Work）负责收敛。
#[async_trait]
pub trait Session: Send + 'static {
    /// 开始新事务；已有活动事务时应返回错误
    async fn begin(&mut self) -> DomainResult<()>;

    /// 当前是否存在活动事务
    fn in_transaction(&self) -> bool;

    /// 提交活动事务
    async fn commit(&mut self) -> DomainResult<()>;

    /// 回滚活动事务
    async fn rollback(&mut self) -> DomainResult<()>;

    /// 释放底层资源（连接、句柄等），无论事务处于何种状态
    async fn close(&mut self) -> DomainResult<()>;
}

/// 会话工厂：宿主环境决定会话的作用域，引擎每次处理消息时打开一个会话
#[async_trait]
pub trait SessionFactory: Send + Sync + 'static {
    type Session: Session;

    async fn open(&self) -> DomainResult<Self::Session>;
}

#[async_trait]
impl<T> SessionFactory for Arc<T>
where
    T: SessionFactory + ?Sized,
{
    type Session = T::Session;

    async fn open(&self) -> DomainResult<Self::Session> {
        (**self).open().await
    }
}
