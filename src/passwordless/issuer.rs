//! 验证码签发

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock, truncate_to_millis};
use crate::config::LoginCodeConfig;
use crate::delivery::DeliveryChannel;
use crate::error::{LoginError, Result, ValidationError};
use crate::identity::{IdentityRecord, PendingCode};
use crate::random::generate_verification_code;
use crate::store::{IdentityStore, InMemoryIdentityStore};

use super::{delivery_call, store_call};

/// 一次签发的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    /// 邮箱
    pub email: String,

    /// 验证码
    pub code: String,

    /// 签发时间（毫秒精度）
    pub issued_at: DateTime<Utc>,

    /// 过期时间（包含）
    pub expires_at: DateTime<Utc>,

    /// 本次新建的身份 ID；邮箱已有记录时为 `None`
    pub created_identity: Option<String>,

    /// 投递是否成功；只有在宽松投递模式下才可能为 `false`
    pub delivered: bool,
}

/// 验证码签发器
///
/// 确保身份存在，生成验证码并覆盖旧的待验证码，然后交给投递通道。
pub struct CodeIssuer<S: IdentityStore = InMemoryIdentityStore> {
    store: Arc<S>,
    channel: Arc<dyn DeliveryChannel>,
    clock: Arc<dyn Clock>,
    config: LoginCodeConfig,
}

impl<S: IdentityStore> CodeIssuer<S> {
    /// 创建签发器
    pub fn new(store: Arc<S>, channel: Arc<dyn DeliveryChannel>) -> Self {
        Self {
            store,
            channel,
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

    /// 获取配置
    pub fn config(&self) -> &LoginCodeConfig {
        &self.config
    }

    /// 签发验证码
    ///
    /// 投递失败时验证码仍然保留在存储中；非宽松模式下返回投递错误。
    pub async fn issue(&self, email: &str) -> Result<IssuedCode> {
        if email.trim().is_empty() {
            return Err(ValidationError::EmptyField("email".to_string()).into());
        }

        let timeout = self.config.io_timeout;
        let now = truncate_to_millis(self.clock.now());

        let fresh = IdentityRecord::new_for_email(email, now)?;
        let created_identity =
            if store_call(timeout, "insert_if_absent", self.store.insert_if_absent(&fresh)).await? {
                debug!(email = %email, id = %fresh.id, "identity created");
                Some(fresh.id)
            } else {
                None
            };

        let code = generate_verification_code();
        let pending = PendingCode::new(code.clone(), now);
        let stored =
            store_call(timeout, "set_pending_code", self.store.set_pending_code(email, &pending))
                .await?;
        if !stored {
            return Err(LoginError::IdentityNotFound.into());
        }

        let delivered = match delivery_call(
            timeout,
            self.channel.deliver(email, &code, self.config.purpose),
        )
        .await
        {
            Ok(()) => true,
            Err(err) if self.config.lenient_delivery => {
                warn!(email = %email, error = %err, "delivery failed, reporting success (lenient delivery)");
                false
            }
            Err(err) => return Err(err),
        };

        Ok(IssuedCode {
            email: email.to_string(),
            code,
            issued_at: now,
            expires_at: now + ChronoDuration::milliseconds(self.config.code_ttl_millis()),
            created_identity,
            delivered,
        })
    }
}
