//! 邮件传输
//!
//! 在 lettre 之上提供一层薄抽象：`Mailer` trait 定义发送接口，
//! `SmtpMailer` 是生产实现，`MockMailer` 供测试注入失败场景。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::sync::Mutex;
use tracing::debug;

use loyalty_shared::config::MailConfig;
use loyalty_shared::error::{LoyaltyError, Result};

/// 待发送的邮件
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// 邮件发送接口
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<()>;
}

/// SMTP 邮件发送器
#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// 从配置构建发送器
    ///
    /// 使用 STARTTLS 连接；凭证未配置时以匿名方式连接（本地 relay 调试用）
    pub fn from_config(config: &MailConfig) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| LoyaltyError::Config(format!("SMTP 配置无效: {e}")))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| LoyaltyError::Config(format!("发件人地址无效: {e}")))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &EmailMessage) -> Result<()> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| LoyaltyError::Mail(format!("收件人地址无效: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())
            .map_err(|e| LoyaltyError::Mail(format!("构建邮件失败: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| LoyaltyError::Mail(e.to_string()))?;

        debug!(to = %email.to, subject = %email.subject, "邮件已交付 SMTP");

        Ok(())
    }
}

/// Mock 邮件发送器
///
/// 记录发出的邮件；`failing()` 构建的实例对所有发送返回错误，
/// 用于验证传输失败时的状态降级。
#[derive(Default)]
pub struct MockMailer {
    fail_sending: bool,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有发送都失败的实例
    pub fn failing() -> Self {
        Self {
            fail_sending: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// 已发送的邮件快照
    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailer 锁中毒").clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("mailer 锁中毒").len()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, email: &EmailMessage) -> Result<()> {
        if self.fail_sending {
            return Err(LoyaltyError::Mail("模拟 SMTP 发送失败".to_string()));
        }
        self.sent.lock().expect("mailer 锁中毒").push(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_email() -> EmailMessage {
        EmailMessage {
            to: "user@example.com".to_string(),
            subject: "Поздравляем!".to_string(),
            html_body: "<p>hello</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_mailer_records_messages() {
        let mailer = MockMailer::new();
        mailer.send(&sample_email()).await.unwrap();
        mailer.send(&sample_email()).await.unwrap();

        assert_eq!(mailer.sent_count(), 2);
        assert_eq!(mailer.sent_messages()[0].to, "user@example.com");
    }

    #[tokio::test]
    async fn test_failing_mock_mailer() {
        let mailer = MockMailer::failing();
        let err = mailer.send(&sample_email()).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::Mail(_)));
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_smtp_mailer_from_config() {
        let config = MailConfig::default();
        let mailer = SmtpMailer::from_config(&config).unwrap();
        assert_eq!(mailer.from.email.to_string(), "noreply@loyalty-card.local");
    }

    #[tokio::test]
    async fn test_smtp_mailer_rejects_bad_from() {
        let config = MailConfig {
            from_address: "not an address".to_string(),
            ..Default::default()
        };
        let err = SmtpMailer::from_config(&config).unwrap_err();
        assert!(matches!(err, LoyaltyError::Config(_)));
    }
}
