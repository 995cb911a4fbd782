//! 投递通道
//!
//! 签发器只关心投递成功或失败，邮件内容与传输由具体通道负责：
//!
//! - [`SmtpDelivery`]: 通过 SMTP 发送 HTML + 纯文本邮件（`smtp` feature）
//! - [`LogDelivery`]: 只写日志，适合本地运行
//! - [`MemoryOutbox`]: 记录在内存中，可切换为失败模式，适合测试

pub mod outbox;
#[cfg(feature = "smtp")]
pub mod smtp;
pub mod template;

pub use outbox::{DeliveredCode, MemoryOutbox};
#[cfg(feature = "smtp")]
pub use smtp::SmtpDelivery;
pub use template::VerificationEmail;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;

/// 验证码用途标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodePurpose {
    /// 登录
    #[default]
    Login,
    /// 注册
    Register,
}

impl std::fmt::Display for CodePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodePurpose::Login => write!(f, "login"),
            CodePurpose::Register => write!(f, "register"),
        }
    }
}

/// 投递通道接口
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// 把验证码投递到目标邮箱
    async fn deliver(&self, email: &str, code: &str, purpose: CodePurpose) -> Result<()>;
}

/// 日志投递通道
///
/// 不发送任何邮件，验证码只在 `debug` 级别输出。
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDelivery;

impl LogDelivery {
    /// 创建日志投递通道
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeliveryChannel for LogDelivery {
    async fn deliver(&self, email: &str, code: &str, purpose: CodePurpose) -> Result<()> {
        info!(email = %email, purpose = %purpose, "verification code delivery stub");
        debug!(email = %email, code = %code, "verification code");
        Ok(())
    }
}
