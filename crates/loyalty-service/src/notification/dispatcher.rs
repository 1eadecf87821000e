//! 确认邮件调度器
//!
//! 驱动每个用户的邮件状态机：created → sent → opened，失败分支 created → failed。
//!
//! ## 状态约定
//!
//! - 注册提交后只创建一条邮件任务（令牌随机、唯一）
//! - 没有激活的邮件模板时静默跳过，任务与用户状态都不变
//! - 传输失败记为用户状态 Failed，不向注册方抛错，不自动重试
//! - 追踪像素幂等：opened_at 只写一次，重复命中与无效令牌都是空操作

use std::sync::{Arc, LazyLock};

use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use regex::Regex;
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};

use crate::models::{Customer, EmailStatus, TextBlock, TextPlace};
use crate::repository::{
    ContentRepository, CustomerRepository, EmailTaskRepository, SiteConfigRepository,
};
use loyalty_shared::error::Result;

use super::mailer::{EmailMessage, Mailer};
use super::template::TemplateEngine;

/// 追踪令牌长度
pub const TOKEN_LENGTH: usize = 12;

/// 合法令牌：12 位字母数字
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^[A-Za-z0-9]{{{TOKEN_LENGTH}}}$")).unwrap());

/// 生成随机追踪令牌
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// 构建确认邮件的 HTML 正文
///
/// 固定布局包住渲染后的文案，末尾埋入打开追踪像素
fn build_email_html(message: &str, token: &str, base_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .content {{ background: #f9f9f9; padding: 20px; border-radius: 8px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="content">{message}</div>
    </div>
    <img src="{base_url}/opened/?token={token}" width="1" height="1" alt="">
</body>
</html>"#
    )
}

/// 确认邮件调度器
pub struct NotificationDispatcher {
    customers: CustomerRepository,
    tasks: EmailTaskRepository,
    content: ContentRepository,
    site_config: SiteConfigRepository,
    mailer: Arc<dyn Mailer>,
    engine: TemplateEngine,
    /// 站点基础 URL，用于拼接像素链接
    base_url: String,
}

impl NotificationDispatcher {
    pub fn new(pool: PgPool, mailer: Arc<dyn Mailer>, base_url: String) -> Self {
        Self {
            customers: CustomerRepository::new(pool.clone()),
            tasks: EmailTaskRepository::new(pool.clone()),
            content: ContentRepository::new(pool.clone()),
            site_config: SiteConfigRepository::new(pool),
            mailer,
            engine: TemplateEngine::new(),
            base_url,
        }
    }

    /// 为新用户派发确认邮件
    ///
    /// 返回派发后的用户邮件状态。邮件传输错误被吞掉并降级为
    /// Failed 状态；数据库错误正常向上传播。
    #[instrument(skip(self, customer), fields(customer_id = customer.id))]
    pub async fn dispatch(&self, customer: &Customer) -> Result<EmailStatus> {
        let task = self.tasks.create(customer.id, &generate_token()).await?;

        let Some(block) = self.content.active_text(TextPlace::Email).await? else {
            debug!("没有激活的邮件模板，跳过发送");
            return Ok(customer.email_status);
        };

        let ctx = TextBlock::template_context(customer);
        let message = self.engine.render(&block.text, &ctx);
        let html = build_email_html(&message, &task.token, &self.base_url);
        let subject = self.site_config.get().await?.email_subject;

        let email = EmailMessage {
            to: customer.email.clone(),
            subject,
            html_body: html,
        };

        match self.mailer.send(&email).await {
            Ok(()) => {
                self.tasks.mark_sent(task.id, Utc::now()).await?;
                self.customers
                    .set_email_status(customer.id, EmailStatus::Sent)
                    .await?;
                info!(task_id = task.id, "确认邮件已发送");
                Ok(EmailStatus::Sent)
            }
            Err(e) => {
                // 传输失败只降级状态，注册流程照常结束
                warn!(task_id = task.id, error = %e, "确认邮件发送失败");
                self.customers
                    .set_email_status(customer.id, EmailStatus::Failed)
                    .await?;
                Ok(EmailStatus::Failed)
            }
        }
    }

    /// 处理追踪像素命中
    ///
    /// 返回是否产生了状态变化。格式不合法的令牌直接忽略。
    #[instrument(skip(self))]
    pub async fn mark_opened(&self, token: &str) -> Result<bool> {
        if !TOKEN_RE.is_match(token) {
            debug!("令牌格式不合法，忽略");
            return Ok(false);
        }

        match self.tasks.mark_opened(token).await? {
            Some(customer_id) => {
                self.customers
                    .set_email_status(customer_id, EmailStatus::Opened)
                    .await?;
                info!(customer_id, "确认邮件已打开");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
