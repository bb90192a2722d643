//! 工作单元（Unit of Work）
//!
//! 围绕一次分发尝试的事务边界，负责把会话的原始事务语义收敛为：
//! - `begin`：已有活动事务时为空操作，否则开启新事务；
//! - `commit`：必须存在活动事务；
//! - `rollback`：无活动事务时为空操作；
//! - `dispose`：无论事务状态如何都释放会话。

use crate::error::AppError;
use rules_domain::persist::Session;

pub struct UnitOfWork<S: Session> {
    session: Option<S>,
}

impl<S: Session> UnitOfWork<S> {
    pub fn new(session: S) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub async fn begin(&mut self) -> Result<(), AppError> {
        let session = self.session_mut()?;
        if session.in_transaction() {
            return Ok(());
        }
        session.begin().await?;
        Ok(())
    }

    pub async fn commit(&mut self) -> Result<(), AppError> {
        let session = self.session_mut()?;
        if !session.in_transaction() {
            return Err(AppError::TransactionState("commit without an active transaction"));
        }
        session.commit().await?;
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<(), AppError> {
        let session = self.session_mut()?;
        if !session.in_transaction() {
            return Ok(());
        }
        session.rollback().await?;
        Ok(())
    }

    /// 释放会话；未提交的事务由会话自行丢弃
    pub async fn dispose(mut self) -> Result<(), AppError> {
        if let Some(mut session) = self.session.take() {
            session.close().await?;
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.in_transaction())
    }

    /// 交给处理器的事务上下文
    pub fn session_mut(&mut self) -> Result<&mut S, AppError> {
        self.session
            .as_mut()
            .ok_or(AppError::TransactionState("unit of work already disposed"))
    }
}

impl<S: Session> Drop for UnitOfWork<S> {
    fn drop(&mut self) {
        if self.session.is_some() {
            tracing::warn!("unit of work dropped without dispose");
        }
    }
}
