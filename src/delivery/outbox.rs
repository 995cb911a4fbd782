//! 内存投递通道

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::{Error, Result};

use super::{CodePurpose, DeliveryChannel};

/// 一次投递记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredCode {
    pub email: String,
    pub code: String,
    pub purpose: CodePurpose,
    pub delivered_at: DateTime<Utc>,
}

/// 内存投递通道
///
/// 记录每次成功投递；`set_failing(true)` 之后所有投递都返回失败且不记录。
/// 克隆体共享同一份记录。
#[derive(Debug, Clone, Default)]
pub struct MemoryOutbox {
    deliveries: Arc<RwLock<Vec<DeliveredCode>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryOutbox {
    /// 创建内存投递通道
    pub fn new() -> Self {
        Self::default()
    }

    /// 切换失败模式
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// 全部投递记录
    pub fn deliveries(&self) -> Vec<DeliveredCode> {
        self.deliveries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// 投递次数
    pub fn delivery_count(&self) -> usize {
        self.deliveries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// 某个邮箱最近收到的验证码
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.deliveries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .find(|d| d.email == email)
            .map(|d| d.code.clone())
    }

    /// 清空记录
    pub fn clear(&self) {
        self.deliveries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

#[async_trait]
impl DeliveryChannel for MemoryOutbox {
    async fn deliver(&self, email: &str, code: &str, purpose: CodePurpose) -> Result<()> {
        if self.failing.load(Ordering::Acquire) {
            return Err(Error::delivery_failed("outbox is in failing mode"));
        }

        self.deliveries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(DeliveredCode {
                email: email.to_string(),
                code: code.to_string(),
                purpose,
                delivered_at: Utc::now(),
            });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_deliveries() {
        let outbox = MemoryOutbox::new();
        outbox
            .deliver("ana@example.com", "111111", CodePurpose::Login)
            .await
            .unwrap();
        outbox
            .deliver("ana@example.com", "222222", CodePurpose::Login)
            .await
            .unwrap();

        assert_eq!(outbox.delivery_count(), 2);
        assert_eq!(outbox.last_code_for("ana@example.com").as_deref(), Some("222222"));
        assert!(outbox.last_code_for("bob@example.com").is_none());
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let outbox = MemoryOutbox::new();
        outbox.set_failing(true);
        assert!(
            outbox
                .deliver("ana@example.com", "111111", CodePurpose::Login)
                .await
                .is_err()
        );
        assert_eq!(outbox.delivery_count(), 0);
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let outbox = MemoryOutbox::new();
        let handle = outbox.clone();
        outbox
            .deliver("ana@example.com", "111111", CodePurpose::Register)
            .await
            .unwrap();
        assert_eq!(handle.deliveries()[0].purpose, CodePurpose::Register);

        handle.clear();
        assert_eq!(outbox.delivery_count(), 0);
    }
}
