//! 邮件任务仓储

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::models::EmailTask;
use loyalty_shared::error::Result;

const SELECT_COLUMNS: &str = "id, customer_id, created_at, sent_at, opened_at, token";

/// 邮件任务仓储
pub struct EmailTaskRepository {
    pool: PgPool,
}

impl EmailTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 根据用户 ID 获取任务
    pub async fn get_by_customer(&self, customer_id: i64) -> Result<Option<EmailTask>> {
        let task = sqlx::query_as::<_, EmailTask>(&format!(
            "SELECT {} FROM email_tasks WHERE customer_id = $1 ORDER BY created_at DESC LIMIT 1",
            SELECT_COLUMNS
        ))
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    /// 分页列出任务（按创建时间倒序）
    pub async fn list(&self, offset: i64, limit: i64) -> Result<(Vec<EmailTask>, i64)> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM email_tasks")
            .fetch_one(&self.pool)
            .await?;

        let tasks = sqlx::query_as::<_, EmailTask>(&format!(
            r#"
            SELECT {} FROM email_tasks
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
            SELECT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((tasks, total))
    }

    // ==================== 写入操作 ====================

    /// 创建任务
    pub async fn create(&self, customer_id: i64, token: &str) -> Result<EmailTask> {
        let task = sqlx::query_as::<_, EmailTask>(&format!(
            r#"
            INSERT INTO email_tasks (customer_id, token)
            VALUES ($1, $2)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(customer_id)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    /// 标记任务已发送
    pub async fn mark_sent(&self, id: i64, sent_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE email_tasks SET sent_at = $2 WHERE id = $1")
            .bind(id)
            .bind(sent_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// 按令牌标记任务已打开（幂等）
    ///
    /// 只有 opened_at 仍为空的任务会被更新；命中时返回所属用户 ID。
    /// 无效令牌或重复命中返回 None，不报错。
    pub async fn mark_opened(&self, token: &str) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE email_tasks
            SET opened_at = NOW()
            WHERE token = $1 AND opened_at IS NULL
            RETURNING customer_id
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(customer_id,)| customer_id))
    }

    // ==================== 事务操作 ====================

    /// 在事务中删除全部任务
    pub async fn delete_all_in_tx(tx: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query("DELETE FROM email_tasks").execute(tx).await?;
        Ok(result.rows_affected())
    }
}
