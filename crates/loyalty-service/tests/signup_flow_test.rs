//! 注册流程集成测试
//!
//! 使用真实 PostgreSQL 验证完整链路：注册 → 卡号分配 → 邮件任务
//! → 追踪像素。卡号分配依赖配置行锁与唯一索引，无法用纯 mock 覆盖。
//!
//! ## 运行方式
//!
//! ```bash
//! DATABASE_URL=postgres://... cargo test --test signup_flow_test -- --ignored
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::PgPool;

use loyalty_service::models::{EmailStatus, NewCustomer, TextPlace};
use loyalty_service::notification::{MockMailer, NotificationDispatcher};
use loyalty_service::repository::{ContentRepository, EmailTaskRepository};
use loyalty_service::service::SignupService;

// ==================== 辅助函数 ====================

/// 从环境变量读取数据库 URL，未设置则 panic
fn database_url() -> String {
    std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests")
}

async fn connect() -> PgPool {
    PgPool::connect(&database_url())
        .await
        .expect("数据库连接失败")
}

fn new_customer(email: &str, phone: &str) -> NewCustomer {
    NewCustomer {
        created_at: None,
        first_name: "Ivan".to_string(),
        middle_name: "Ivanovich".to_string(),
        last_name: "Ivanov".to_string(),
        email: email.to_string(),
        phone: phone.to_string(),
        insurance_end: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
        card: None,
        email_status: EmailStatus::NotExist,
        utm_link: None,
    }
}

fn setup_service(pool: &PgPool, mailer: Arc<MockMailer>) -> SignupService {
    let dispatcher = Arc::new(NotificationDispatcher::new(
        pool.clone(),
        mailer,
        "http://flow.test".to_string(),
    ));
    SignupService::new(pool.clone(), dispatcher)
}

async fn cleanup_customer(pool: &PgPool, id: i64) {
    sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .expect("清理测试用户失败");
}

// ==================== 测试 ====================

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_signup_assigns_card_and_creates_task() {
    let pool = connect().await;
    let mailer = Arc::new(MockMailer::new());
    let service = setup_service(&pool, mailer);

    let outcome = service
        .register(new_customer("flow_card@it.test", "0931000001"))
        .await
        .expect("注册失败");

    // 默认号段有空位，卡号应已分配
    assert!(outcome.customer.card.is_some());
    assert!(outcome.customer.card_name().starts_with("UV "));

    // 恰好一条邮件任务
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM email_tasks WHERE customer_id = $1")
        .bind(outcome.customer.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);

    cleanup_customer(&pool, outcome.customer.id).await;
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_pixel_hit_is_idempotent() {
    let pool = connect().await;
    let mailer = Arc::new(MockMailer::new());
    let dispatcher = Arc::new(NotificationDispatcher::new(
        pool.clone(),
        mailer.clone(),
        "http://flow.test".to_string(),
    ));
    let service = SignupService::new(pool.clone(), dispatcher.clone());

    let outcome = service
        .register(new_customer("flow_pixel@it.test", "0931000002"))
        .await
        .unwrap();

    let task = EmailTaskRepository::new(pool.clone())
        .get_by_customer(outcome.customer.id)
        .await
        .unwrap()
        .expect("任务应已创建");

    // 第一次命中：产生状态变化
    let changed = dispatcher.mark_opened(&task.token).await.unwrap();
    assert!(changed);

    let opened_at_first = EmailTaskRepository::new(pool.clone())
        .get_by_customer(outcome.customer.id)
        .await
        .unwrap()
        .unwrap()
        .opened_at
        .expect("opened_at 应已写入");

    // 第二次命中：opened_at 不变
    let changed = dispatcher.mark_opened(&task.token).await.unwrap();
    assert!(!changed);

    let opened_at_second = EmailTaskRepository::new(pool.clone())
        .get_by_customer(outcome.customer.id)
        .await
        .unwrap()
        .unwrap()
        .opened_at
        .unwrap();
    assert_eq!(opened_at_first, opened_at_second);

    // 用户状态推进到已打开
    let (status,): (EmailStatus,) =
        sqlx::query_as("SELECT email_status FROM customers WHERE id = $1")
            .bind(outcome.customer.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(status, EmailStatus::Opened);

    cleanup_customer(&pool, outcome.customer.id).await;
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_invalid_token_causes_no_state_change() {
    let pool = connect().await;
    let mailer = Arc::new(MockMailer::new());
    let dispatcher = NotificationDispatcher::new(pool.clone(), mailer, "http://flow.test".into());

    // 格式合法但不存在的令牌
    assert!(!dispatcher.mark_opened("zzzzzzzzzzzz").await.unwrap());
    // 格式不合法的令牌
    assert!(!dispatcher.mark_opened("../../etc").await.unwrap());
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_sent_email_contains_pixel_link() {
    let pool = connect().await;

    // 激活邮件模板
    let content = ContentRepository::new(pool.clone());
    let block = content
        .create_text(TextPlace::Email, "Ваша карта: {{ card }}", true)
        .await
        .unwrap();

    let mailer = Arc::new(MockMailer::new());
    let service = setup_service(&pool, mailer.clone());

    let outcome = service
        .register(new_customer("flow_mail@it.test", "0931000003"))
        .await
        .unwrap();
    assert_eq!(outcome.customer.email_status, EmailStatus::Sent);

    let sent = mailer.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "flow_mail@it.test");
    // 正文含渲染后的卡片标签与追踪像素链接
    assert!(sent[0].html_body.contains("Ваша карта: UV "));
    assert!(sent[0].html_body.contains("http://flow.test/opened/?token="));

    // 任务已标记发送
    let task = EmailTaskRepository::new(pool.clone())
        .get_by_customer(outcome.customer.id)
        .await
        .unwrap()
        .unwrap();
    assert!(task.sent_at.is_some());
    assert_eq!(task.status(), EmailStatus::Sent);

    cleanup_customer(&pool, outcome.customer.id).await;
    sqlx::query("DELETE FROM text_blocks WHERE id = $1")
        .bind(block.id)
        .execute(&pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_no_template_skips_sending_silently() {
    let pool = connect().await;

    // 确保没有激活的邮件模板
    sqlx::query("UPDATE text_blocks SET is_active = FALSE WHERE place = 'email'")
        .execute(&pool)
        .await
        .unwrap();

    let mailer = Arc::new(MockMailer::new());
    let service = setup_service(&pool, mailer.clone());

    let outcome = service
        .register(new_customer("flow_notpl@it.test", "0931000004"))
        .await
        .unwrap();

    // 没有模板：不发送，状态不变，任务保持 created
    assert_eq!(outcome.customer.email_status, EmailStatus::NotExist);
    assert_eq!(mailer.sent_count(), 0);

    let task = EmailTaskRepository::new(pool.clone())
        .get_by_customer(outcome.customer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(task.status(), EmailStatus::Created);

    cleanup_customer(&pool, outcome.customer.id).await;
}
