//! SMTP 投递通道

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::config::{LoginCodeConfig, MailerConfig, SmtpSecurity};
use crate::error::Result;

use super::{CodePurpose, DeliveryChannel, VerificationEmail};

/// SMTP 投递通道
///
/// 发送纯文本 + HTML 的 multipart/alternative 邮件。
pub struct SmtpDelivery {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    ttl_minutes: u64,
}

impl SmtpDelivery {
    /// 根据配置创建
    ///
    /// 邮件中展示的有效期取自 `login.code_ttl`，与验证时使用的有效期一致。
    pub fn new(config: &MailerConfig, login: &LoginCodeConfig) -> Result<Self> {
        config.validate()?;
        let from: Mailbox = config.from.parse()?;

        let builder = match config.security {
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
            }
            SmtpSecurity::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
        }
        .port(config.port);

        let builder = match &config.credentials {
            Some(creds) => builder.credentials(Credentials::new(
                creds.username.clone(),
                creds.secret.expose_secret().to_string(),
            )),
            None => builder,
        };

        info!(host = %config.host, port = config.port, "smtp delivery configured");

        Ok(Self {
            transport: builder.build(),
            from,
            ttl_minutes: login.code_ttl_minutes(),
        })
    }

    fn build_message(&self, email: &str, code: &str, purpose: CodePurpose) -> Result<Message> {
        let rendered = VerificationEmail::render(code, purpose, self.ttl_minutes);
        let to: Mailbox = email.parse()?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(rendered.subject)
            .multipart(MultiPart::alternative_plain_html(rendered.text, rendered.html))?;
        Ok(message)
    }
}

#[async_trait]
impl DeliveryChannel for SmtpDelivery {
    async fn deliver(&self, email: &str, code: &str, purpose: CodePurpose) -> Result<()> {
        let message = self.build_message(email, code, purpose)?;
        let response = self.transport.send(message).await?;
        debug!(email = %email, smtp_code = %response.code(), "smtp accepted message");
        Ok(())
    }
}
