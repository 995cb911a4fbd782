//! 内存存储实现

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::identity::{IdentityRecord, PendingCode};
use crate::rbac::Role;

use super::{IdentityStore, RoleChange};

/// 内存存储实现
///
/// 适用于单实例部署或测试环境。创建后即处于打开状态；
/// `close` 之后的所有操作返回存储不可用错误，直到再次 `open`。
#[derive(Debug, Clone)]
pub struct InMemoryIdentityStore {
    /// email -> 记录
    records: Arc<RwLock<HashMap<String, IdentityRecord>>>,
    open: Arc<AtomicBool>,
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            open: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl InMemoryIdentityStore {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取当前存储的身份数量
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// 检查存储是否为空
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::store_unavailable("in-memory identity store is closed"))
        }
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn open(&self) -> Result<()> {
        self.open.store(true, Ordering::Release);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.open.store(false, Ordering::Release);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>> {
        self.ensure_open()?;
        Ok(self.records.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>> {
        self.ensure_open()?;
        let records = self.records.read().await;
        Ok(records.values().find(|record| record.id == id).cloned())
    }

    async fn insert_if_absent(&self, record: &IdentityRecord) -> Result<bool> {
        self.ensure_open()?;
        let mut records = self.records.write().await;
        if records.contains_key(&record.email) {
            return Ok(false);
        }
        records.insert(record.email.clone(), record.clone());
        Ok(true)
    }

    async fn set_pending_code(&self, email: &str, pending: &PendingCode) -> Result<bool> {
        self.ensure_open()?;
        let mut records = self.records.write().await;
        match records.get_mut(email) {
            Some(record) => {
                record.pending_code = Some(pending.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_pending_code_if(&self, email: &str, expected: &PendingCode) -> Result<bool> {
        self.ensure_open()?;
        // 比较与清除在同一把写锁内完成
        let mut records = self.records.write().await;
        match records.get_mut(email) {
            Some(record) if record.pending_code.as_ref() == Some(expected) => {
                record.pending_code = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<RoleChange> {
        self.ensure_open()?;
        let mut records = self.records.write().await;
        match records.get_mut(email) {
            None => Ok(RoleChange::NotFound),
            Some(record) if record.role == role => Ok(RoleChange::Unchanged),
            Some(record) => {
                record.role = role;
                Ok(RoleChange::Changed)
            }
        }
    }
}
