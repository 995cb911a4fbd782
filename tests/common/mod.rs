//! 集成测试共用的存储包装
//!
//! [`GatedStore`] 让每个 `find_by_email` 读完记录后在屏障上等待，
//! 所有调用方都拿到同一个待验证码之后才继续执行条件清除。

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use login_code::identity::{IdentityRecord, PendingCode};
use login_code::rbac::Role;
use login_code::store::{IdentityStore, RoleChange};
use login_code::Result;
use tokio::sync::Barrier;

/// 在 `find_by_email` 之后同步所有调用方的存储包装
pub struct GatedStore<S> {
    inner: Arc<S>,
    gate: Barrier,
    unconditional_clear: bool,
}

impl<S: IdentityStore> GatedStore<S> {
    /// `parties` 必须等于并发调用 `find_by_email` 的任务数
    pub fn new(inner: Arc<S>, parties: usize) -> Self {
        Self {
            inner,
            gate: Barrier::new(parties),
            unconditional_clear: false,
        }
    }

    /// 把条件清除换成无条件清除，模拟没有比较的错误实现
    pub fn with_unconditional_clear(mut self) -> Self {
        self.unconditional_clear = true;
        self
    }
}

#[async_trait]
impl<S: IdentityStore> IdentityStore for GatedStore<S> {
    async fn open(&self) -> Result<()> {
        self.inner.open().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>> {
        let found = self.inner.find_by_email(email).await;
        self.gate.wait().await;
        found
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<IdentityRecord>> {
        self.inner.find_by_id(id).await
    }

    async fn insert_if_absent(&self, record: &IdentityRecord) -> Result<bool> {
        self.inner.insert_if_absent(record).await
    }

    async fn set_pending_code(&self, email: &str, pending: &PendingCode) -> Result<bool> {
        self.inner.set_pending_code(email, pending).await
    }

    async fn clear_pending_code_if(&self, email: &str, expected: &PendingCode) -> Result<bool> {
        if self.unconditional_clear {
            self.inner.clear_pending_code_if(email, expected).await?;
            return Ok(true);
        }
        self.inner.clear_pending_code_if(email, expected).await
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<RoleChange> {
        self.inner.set_role(email, role).await
    }
}
