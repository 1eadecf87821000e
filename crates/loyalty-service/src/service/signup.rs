//! 注册服务
//!
//! 把落地页表单提交串成完整流程：
//! 校验 → 分配卡号并落库 → 发送确认邮件 → 渲染成功页文案。
//! 每一步都是显式调用，不依赖隐式钩子。

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{instrument, warn};

use crate::models::{Customer, NewCustomer, TextBlock, TextPlace};
use crate::notification::{NotificationDispatcher, TemplateEngine};
use crate::repository::{ContentRepository, CustomerRepository};
use loyalty_shared::error::Result;

use super::allocator::CardAllocator;

/// 注册结果
#[derive(Debug)]
pub struct SignupOutcome {
    pub customer: Customer,
    /// 成功页文案（没有激活的 success 文本块时为 None）
    pub message: Option<String>,
}

/// 注册服务
pub struct SignupService {
    allocator: CardAllocator,
    customers: CustomerRepository,
    content: ContentRepository,
    dispatcher: Arc<NotificationDispatcher>,
    engine: TemplateEngine,
}

impl SignupService {
    pub fn new(pool: PgPool, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            allocator: CardAllocator::new(pool.clone()),
            customers: CustomerRepository::new(pool.clone()),
            content: ContentRepository::new(pool),
            dispatcher,
            engine: TemplateEngine::new(),
        }
    }

    /// 检查邮箱与手机号的占用情况
    ///
    /// 返回 (email_taken, phone_taken)，供表单逐字段报错。
    /// 并发竞态下漏掉的重复由插入时的唯一约束兜底。
    pub async fn uniqueness_conflicts(&self, email: &str, phone: &str) -> Result<(bool, bool)> {
        self.customers.uniqueness_conflicts(email, phone).await
    }

    /// 执行注册
    ///
    /// 用户插入与卡号分配在同一事务中；确认邮件在事务提交后发送，
    /// 传输失败只记录状态，不影响注册结果。
    #[instrument(skip(self, new_customer), fields(email = %new_customer.email))]
    pub async fn register(&self, new_customer: NewCustomer) -> Result<SignupOutcome> {
        let customer = self.allocator.create_customer(new_customer).await?;

        let email_status = self.dispatcher.dispatch(&customer).await?;

        let message = match self.content.active_text(TextPlace::Success).await {
            Ok(Some(block)) => {
                let ctx = TextBlock::template_context(&customer);
                Some(self.engine.render(&block.text, &ctx))
            }
            Ok(None) => None,
            Err(e) => {
                // 成功页文案缺失不应让已完成的注册报错
                warn!(error = %e, "读取成功页文本失败");
                None
            }
        };

        let mut customer = customer;
        customer.email_status = email_status;

        Ok(SignupOutcome { customer, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmailStatus;
    use crate::notification::MockMailer;
    use chrono::NaiveDate;

    fn new_customer(tag: &str) -> NewCustomer {
        NewCustomer {
            created_at: None,
            first_name: "Ivan".to_string(),
            middle_name: "Ivanovich".to_string(),
            last_name: "Ivanov".to_string(),
            email: format!("{tag}@signup.test"),
            phone: format!("06{:08}", tag.len() * 1234567 % 100_000_000),
            insurance_end: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            card: None,
            email_status: EmailStatus::NotExist,
            utm_link: None,
        }
    }

    async fn setup(pool: &PgPool, mailer: Arc<MockMailer>) -> SignupService {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            pool.clone(),
            mailer,
            "http://test.local".to_string(),
        ));
        SignupService::new(pool.clone(), dispatcher)
    }

    #[tokio::test]
    #[ignore] // 需要数据库连接
    async fn test_register_creates_exactly_one_email_task() {
        use crate::repository::EmailTaskRepository;

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.unwrap();
        let mailer = Arc::new(MockMailer::new());
        let service = setup(&pool, mailer).await;

        let outcome = service.register(new_customer("one_task")).await.unwrap();

        let tasks: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM email_tasks WHERE customer_id = $1")
                .bind(outcome.customer.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(tasks.0, 1);

        let task = EmailTaskRepository::new(pool.clone())
            .get_by_customer(outcome.customer.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.token.len(), 12);

        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(outcome.customer.id)
            .execute(&pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    #[ignore] // 需要数据库连接
    async fn test_register_survives_mail_failure() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.unwrap();

        // 确保有激活的邮件模板，否则发送会被静默跳过
        let repo = ContentRepository::new(pool.clone());
        let block = repo
            .create_text(TextPlace::Email, "Привет, {{first_name}}!", true)
            .await
            .unwrap();

        let mailer = Arc::new(MockMailer::failing());
        let service = setup(&pool, mailer).await;

        let outcome = service.register(new_customer("mail_fail")).await.unwrap();
        // 注册成功，状态记为发送失败
        assert_eq!(outcome.customer.email_status, EmailStatus::Failed);

        sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(outcome.customer.id)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("DELETE FROM text_blocks WHERE id = $1")
            .bind(block.id)
            .execute(&pool)
            .await
            .unwrap();
    }
}
