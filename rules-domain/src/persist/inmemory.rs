//! 内存版数据库与会话（InMemoryDatabase / InMemorySession）
//!
//! 以实体类型名 + 标识为键，将实体序列化为 JSON 存放在内存中：
//! - 会话内的写操作先暂存于事务缓冲区，提交时一次性应用，回滚时整体丢弃；
//! - 会话内的读操作可以看到本事务尚未提交的写入；
//! - 记录打开/开始/提交/回滚/关闭次数，便于断言事务边界行为。
//!
//! 典型用途：测试环境、示例与本地开发。
//!
use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::persist::{Session, SessionFactory};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

type RowKey = (&'static str, String);

fn row_key<E: Entity>(id: &E::Id) -> RowKey {
    (E::TYPE, id.to_string())
}

/// 事务计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionStats {
    pub opened: usize,
    pub begun: usize,
    pub committed: usize,
    pub rolled_back: usize,
    pub closed: usize,
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    closed: AtomicUsize,
}

#[derive(Default)]
struct Inner {
    rows: RwLock<BTreeMap<RowKey, Value>>,
    counters: Counters,
    fail_next_commit: AtomicBool,
}

/// 内存数据库，同时作为 `SessionFactory` 为每次调用打开新会话
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    inner: Arc<Inner>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前事务计数
    pub fn stats(&self) -> TransactionStats {
        let c = &self.inner.counters;
        TransactionStats {
            opened: c.opened.load(Ordering::SeqCst),
            begun: c.begun.load(Ordering::SeqCst),
            committed: c.committed.load(Ordering::SeqCst),
            rolled_back: c.rolled_back.load(Ordering::SeqCst),
            closed: c.closed.load(Ordering::SeqCst),
        }
    }

    /// 令下一次提交失败（事务保持活动状态，需由调用方回滚）
    pub fn fail_next_commit(&self) {
        self.inner.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// 绕过事务直接写入已提交数据（用于初始化测试数据）
    pub fn seed<E>(&self, entity: &E) -> DomainResult<()>
    where
        E: Entity + Serialize,
    {
        let value = serde_json::to_value(entity)?;
        self.apply(vec![Write::Put(row_key::<E>(entity.id()), value)])
    }

    /// 读取已提交的实体
    pub fn get<E>(&self, id: &E::Id) -> DomainResult<Option<E>>
    where
        E: Entity + DeserializeOwned,
    {
        let rows = self.read_rows()?;
        rows.get(&row_key::<E>(id))
            .map(|v| serde_json::from_value(v.clone()).map_err(DomainError::from))
            .transpose()
    }

    /// 已提交的某类实体数量
    pub fn count<E: Entity>(&self) -> DomainResult<usize> {
        let rows = self.read_rows()?;
        Ok(rows.keys().filter(|(ty, _)| *ty == E::TYPE).count())
    }

    fn read_rows(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, BTreeMap<RowKey, Value>>> {
        self.inner
            .rows
            .read()
            .map_err(|_| DomainError::database("rows lock poisoned"))
    }

    fn apply(&self, writes: Vec<Write>) -> DomainResult<()> {
        let mut rows = self
            .inner
            .rows
            .write()
            .map_err(|_| DomainError::database("rows lock poisoned"))?;
        for write in writes {
            match write {
                Write::Put(key, value) => {
                    rows.insert(key, value);
                }
                Write::Delete(key) => {
                    rows.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for InMemoryDatabase {
    type Session = InMemorySession;

    async fn open(&self) -> DomainResult<Self::Session> {
        self.inner.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(InMemorySession {
            db: self.clone(),
            pending: None,
            closed: false,
        })
    }
}

enum Write {
    Put(RowKey, Value),
    Delete(RowKey),
}

impl Write {
    fn key(&self) -> &RowKey {
        match self {
            Write::Put(key, _) | Write::Delete(key) => key,
        }
    }
}

/// 内存会话：事务内写入暂存，提交时落入 `InMemoryDatabase`
pub struct InMemorySession {
    db: InMemoryDatabase,
    pending: Option<Vec<Write>>,
    closed: bool,
}

impl InMemorySession {
    /// 按标识读取实体（可见本事务未提交的写入）
    pub fn get<E>(&self, id: &E::Id) -> DomainResult<Option<E>>
    where
        E: Entity + DeserializeOwned,
    {
        self.ensure_open()?;
        let key = row_key::<E>(id);

        let staged = self
            .pending
            .iter()
            .flatten()
            .rev()
            .find(|w| w.key() == &key);

        match staged {
            Some(Write::Put(_, value)) => Ok(Some(serde_json::from_value(value.clone())?)),
            Some(Write::Delete(_)) => Ok(None),
            None => self.db.get::<E>(id),
        }
    }

    /// 列出某类实体（按标识字符串排序，叠加本事务未提交的写入）
    pub fn list<E>(&self) -> DomainResult<Vec<E>>
    where
        E: Entity + DeserializeOwned,
    {
        self.ensure_open()?;
        let mut view: BTreeMap<String, Value> = self
            .db
            .read_rows()?
            .iter()
            .filter(|((ty, _), _)| *ty == E::TYPE)
            .map(|((_, id), v)| (id.clone(), v.clone()))
            .collect();

        for write in self.pending.iter().flatten() {
            match write {
                Write::Put((ty, id), value) if *ty == E::TYPE => {
                    view.insert(id.clone(), value.clone());
                }
                Write::Delete((ty, id)) if *ty == E::TYPE => {
                    view.remove(id);
                }
                _ => {}
            }
        }

        view.into_values()
            .map(|v| serde_json::from_value(v).map_err(DomainError::from))
            .collect()
    }

    /// 写入实体（需处于事务中）
    pub fn put<E>(&mut self, entity: &E) -> DomainResult<()>
    where
        E: Entity + Serialize,
    {
        let value = serde_json::to_value(entity)?;
        self.pending_mut()?
            .push(Write::Put(row_key::<E>(entity.id()), value));
        Ok(())
    }

    /// 删除实体（需处于事务中），返回删除前是否存在
    pub fn delete<E>(&mut self, id: &E::Id) -> DomainResult<bool>
    where
        E: Entity + DeserializeOwned,
    {
        let existed = self.get::<E>(id)?.is_some();
        self.pending_mut()?.push(Write::Delete(row_key::<E>(id)));
        Ok(existed)
    }

    fn ensure_open(&self) -> DomainResult<()> {
        if self.closed {
            return Err(DomainError::session("session already closed"));
        }
        Ok(())
    }

    fn pending_mut(&mut self) -> DomainResult<&mut Vec<Write>> {
        self.ensure_open()?;
        self.pending
            .as_mut()
            .ok_or_else(|| DomainError::invalid_state("write outside of a transaction"))
    }
}

#[async_trait]
impl Session for InMemorySession {
    async fn begin(&mut self) -> DomainResult<()> {
        self.ensure_open()?;
        if self.pending.is_some() {
            return Err(DomainError::invalid_state("transaction already active"));
        }
        self.pending = Some(Vec::new());
        self.db.inner.counters.begun.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.pending.is_some()
    }

    async fn commit(&mut self) -> DomainResult<()> {
        self.ensure_open()?;
        if self.pending.is_none() {
            return Err(DomainError::invalid_state("no active transaction"));
        }
        if self.db.inner.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(DomainError::database("commit rejected by storage"));
        }

        let writes = self.pending.take().unwrap_or_default();
        tracing::debug!(writes = writes.len(), "in-memory transaction committed");
        self.db.apply(writes)?;
        self.db.inner.counters.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&mut self) -> DomainResult<()> {
        if let Some(writes) = self.pending.take() {
            tracing::debug!(discarded = writes.len(), "in-memory transaction rolled back");
            self.db.inner.counters.rolled_back.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn close(&mut self) -> DomainResult<()> {
        if self.closed {
            return Ok(());
        }
        self.pending = None;
        self.closed = true;
        self.db.inner.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
