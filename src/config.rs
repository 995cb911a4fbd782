//! 配置
//!
//! [`LoginCodeConfig`] 控制验证码有效期、I/O 超时和投递失败策略；
//! [`MailerConfig`] 描述 SMTP 投递参数。

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::delivery::CodePurpose;
use crate::error::{ConfigError, Result};

/// 默认验证码有效期：10 分钟
pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(10 * 60);

/// 默认 I/O 超时
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// 登录验证码配置
// ============================================================================

/// 登录验证码配置
#[derive(Debug, Clone)]
pub struct LoginCodeConfig {
    /// 验证码有效期（包含边界）
    pub code_ttl: Duration,

    /// 单次存储或投递调用的超时
    pub io_timeout: Duration,

    /// 投递失败时是否仍向调用方报告成功（仅开发环境）
    pub lenient_delivery: bool,

    /// 投递时附带的用途标签
    pub purpose: CodePurpose,
}

impl Default for LoginCodeConfig {
    fn default() -> Self {
        Self {
            code_ttl: DEFAULT_CODE_TTL,
            io_timeout: DEFAULT_IO_TIMEOUT,
            lenient_delivery: false,
            purpose: CodePurpose::Login,
        }
    }
}

impl LoginCodeConfig {
    /// 创建新配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置有效期
    pub fn with_code_ttl(mut self, ttl: Duration) -> Self {
        self.code_ttl = ttl;
        self
    }

    /// 设置 I/O 超时
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// 设置投递失败是否放行
    pub fn with_lenient_delivery(mut self, lenient: bool) -> Self {
        self.lenient_delivery = lenient;
        self
    }

    /// 设置用途标签
    pub fn with_purpose(mut self, purpose: CodePurpose) -> Self {
        self.purpose = purpose;
        self
    }

    /// 开发环境配置
    ///
    /// - 10 分钟有效期
    /// - 投递失败仍报告成功（本地没有邮件服务时也能登录）
    pub fn development() -> Self {
        Self {
            lenient_delivery: true,
            ..Self::default()
        }
    }

    /// 严格配置
    ///
    /// - 10 分钟有效期
    /// - 3 秒 I/O 超时
    /// - 投递失败即失败
    pub fn strict() -> Self {
        Self {
            io_timeout: Duration::from_secs(3),
            ..Self::default()
        }
    }

    /// 有效期（毫秒）
    pub fn code_ttl_millis(&self) -> i64 {
        i64::try_from(self.code_ttl.as_millis()).unwrap_or(i64::MAX)
    }

    /// 有效期（分钟，向上取整），用于邮件文案
    pub fn code_ttl_minutes(&self) -> u64 {
        self.code_ttl.as_secs().div_ceil(60)
    }
}

// ============================================================================
// 邮件配置
// ============================================================================

/// SMTP 连接安全方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// 明文（本地 MailHog）
    None,
    /// 隐式 TLS（465 端口）
    Implicit,
}

/// SMTP 认证信息
#[derive(Debug)]
pub struct SmtpCredentials {
    pub username: String,
    pub secret: SecretString,
}

/// 邮件投递配置
#[derive(Debug)]
pub struct MailerConfig {
    /// SMTP 主机
    pub host: String,

    /// SMTP 端口
    pub port: u16,

    /// 发件人，例如 `Course Catalog <noreply@example.com>`
    pub from: String,

    /// 连接安全方式
    pub security: SmtpSecurity,

    /// 认证信息
    pub credentials: Option<SmtpCredentials>,
}

/// 默认发件人
pub const DEFAULT_FROM: &str = "Course Catalog <noreply@yourdomain.com>";

impl MailerConfig {
    /// 本地 MailHog：localhost:1025，无 TLS、无认证
    pub fn mailhog() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1025,
            from: DEFAULT_FROM.to_string(),
            security: SmtpSecurity::None,
            credentials: None,
        }
    }

    /// Resend SMTP：smtp.resend.com:465，隐式 TLS，用户名固定为 `resend`
    pub fn resend(api_key: impl Into<String>) -> Self {
        Self {
            host: "smtp.resend.com".to_string(),
            port: 465,
            from: DEFAULT_FROM.to_string(),
            security: SmtpSecurity::Implicit,
            credentials: Some(SmtpCredentials {
                username: "resend".to_string(),
                secret: SecretString::from(api_key.into()),
            }),
        }
    }

    /// 按运行环境选择邮件配置
    ///
    /// 开发环境且主机为空或为本机时使用 MailHog，否则使用 Resend；
    /// 显式给出的主机、端口、发件人覆盖预设值。
    pub fn for_environment(
        development: bool,
        host: Option<&str>,
        port: Option<u16>,
        from: Option<&str>,
        api_key: Option<&str>,
    ) -> Self {
        let local_host = host.is_none_or(|h| matches!(h, "localhost" | "127.0.0.1"));
        let mut config = if development && local_host {
            Self::mailhog()
        } else {
            Self::resend(api_key.unwrap_or_default())
        };

        if let Some(host) = host {
            config.host = host.to_string();
        }
        if let Some(port) = port {
            config.port = port;
        }
        if let Some(from) = from {
            config.from = from.to_string();
        }
        config
    }

    /// 设置主机
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// 设置端口
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// 设置发件人
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    /// 是否是本地开发邮件服务
    pub fn is_local(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1")
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingRequired("EMAIL_HOST".to_string()).into());
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "EMAIL_PORT".to_string(),
                message: "port must be non-zero".to_string(),
            }
            .into());
        }
        if self.from.trim().is_empty() {
            return Err(ConfigError::MissingRequired("EMAIL_FROM".to_string()).into());
        }
        if self.security == SmtpSecurity::Implicit {
            match &self.credentials {
                Some(creds) if !creds.secret.expose_secret().is_empty() => {}
                _ => {
                    return Err(ConfigError::MissingRequired("RESEND_API_KEY".to_string()).into());
                }
            }
        }
        Ok(())
    }
}
