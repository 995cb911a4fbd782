//! 验证码验证

use std::sync::Arc;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::config::LoginCodeConfig;
use crate::error::{LoginError, Result};
use crate::identity::PublicIdentity;
use crate::store::{IdentityStore, InMemoryIdentityStore};

use super::store_call;
use super::validity::{CodeCheck, check_pending};

/// 验证码验证器
///
/// 验证成功时通过条件写清除待验证码，同一个验证码最多成功一次。
pub struct CodeVerifier<S: IdentityStore = InMemoryIdentityStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: LoginCodeConfig,
}

impl<S: IdentityStore> CodeVerifier<S> {
    /// 创建验证器
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config: LoginCodeConfig::default(),
        }
    }

    /// 设置时钟
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 设置配置
    pub fn with_config(mut self, config: LoginCodeConfig) -> Self {
        self.config = config;
        self
    }

    /// 验证验证码
    ///
    /// - 邮箱不存在: `LoginError::IdentityNotFound`
    /// - 没有待验证码或不匹配: `LoginError::InvalidCode`
    /// - 匹配但过期: `LoginError::Expired`
    ///
    /// 失败时不修改存储。
    pub async fn verify(&self, email: &str, code: &str) -> Result<PublicIdentity> {
        let timeout = self.config.io_timeout;

        let record = store_call(timeout, "find_by_email", self.store.find_by_email(email))
            .await?
            .ok_or(LoginError::IdentityNotFound)?;

        let Some(pending) = record.pending_code.as_ref() else {
            return Err(LoginError::InvalidCode.into());
        };

        match check_pending(
            Some(pending),
            code,
            self.clock.now(),
            self.config.code_ttl_millis(),
        ) {
            CodeCheck::Valid => {}
            CodeCheck::Expired => return Err(LoginError::Expired.into()),
            CodeCheck::Missing | CodeCheck::Mismatch => {
                return Err(LoginError::InvalidCode.into());
            }
        }

        let cleared = store_call(
            timeout,
            "clear_pending_code_if",
            self.store.clear_pending_code_if(&record.email, pending),
        )
        .await?;
        if !cleared {
            debug!(email = %email, "pending code changed before it could be consumed");
            return Err(LoginError::InvalidCode.into());
        }

        Ok(record.public())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::Error;
    use crate::identity::{IdentityRecord, PendingCode};
    use chrono::Duration;

    async fn seeded(clock: &ManualClock, code: &str) -> Arc<InMemoryIdentityStore> {
        let store = Arc::new(InMemoryIdentityStore::new());
        let record = IdentityRecord::new_for_email("ana@example.com", clock.now()).unwrap();
        store.insert_if_absent(&record).await.unwrap();
        store
            .set_pending_code("ana@example.com", &PendingCode::new(code, clock.now()))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_verify_consumes_code() {
        let clock = ManualClock::starting_now();
        let store = seeded(&clock, "123456").await;
        let verifier = CodeVerifier::new(store.clone()).with_clock(Arc::new(clock.clone()));

        let identity = verifier.verify("ana@example.com", "123456").await.unwrap();
        assert_eq!(identity.name, "ana");

        let err = verifier.verify("ana@example.com", "123456").await.unwrap_err();
        assert!(matches!(err, Error::Login(LoginError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_unknown_email() {
        let verifier = CodeVerifier::new(Arc::new(InMemoryIdentityStore::new()));
        let err = verifier.verify("ghost@example.com", "123456").await.unwrap_err();
        assert!(matches!(err, Error::Login(LoginError::IdentityNotFound)));
    }

    #[tokio::test]
    async fn test_expired_code_is_kept() {
        let clock = ManualClock::starting_now();
        let store = seeded(&clock, "123456").await;
        let verifier = CodeVerifier::new(store.clone()).with_clock(Arc::new(clock.clone()));

        clock.advance(Duration::milliseconds(600_001));
        let err = verifier.verify("ana@example.com", "123456").await.unwrap_err();
        assert!(matches!(err, Error::Login(LoginError::Expired)));

        let record = store.find_by_email("ana@example.com").await.unwrap().unwrap();
        assert!(record.has_pending_code());
    }

    #[tokio::test]
    async fn test_wrong_code_leaves_pending() {
        let clock = ManualClock::starting_now();
        let store = seeded(&clock, "123456").await;
        let verifier = CodeVerifier::new(store.clone()).with_clock(Arc::new(clock));

        assert!(verifier.verify("ana@example.com", "000000").await.is_err());
        assert!(verifier.verify("ana@example.com", "123456").await.is_ok());
    }
}
