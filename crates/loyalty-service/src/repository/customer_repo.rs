//! 用户仓储
//!
//! 提供用户记录的数据访问，支持事务内的卡号扫描与批量导入

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};

use crate::models::{Customer, EmailStatus, NewCustomer};
use loyalty_shared::error::{LoyaltyError, Result};

const SELECT_COLUMNS: &str = "id, created_at, first_name, middle_name, last_name, email, phone, \
     insurance_end, card, email_status, utm_link";

/// 用户列表筛选条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    /// 是否持卡
    pub has_card: Option<bool>,
    /// 邮件状态
    pub email_status: Option<EmailStatus>,
    /// 注册时间范围
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    /// 保险到期日范围
    pub insurance_from: Option<NaiveDate>,
    pub insurance_to: Option<NaiveDate>,
}

const FILTER_WHERE: &str = r#"
      ($1::bool IS NULL OR (card IS NOT NULL) = $1)
  AND ($2::int IS NULL OR email_status = $2)
  AND ($3::timestamptz IS NULL OR created_at >= $3)
  AND ($4::timestamptz IS NULL OR created_at <= $4)
  AND ($5::date IS NULL OR insurance_end >= $5)
  AND ($6::date IS NULL OR insurance_end <= $6)
"#;

/// 用户仓储
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 查询操作 ====================

    /// 根据 ID 获取用户
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// 检查邮箱/手机号是否已被占用
    ///
    /// 返回占用情况 (email_taken, phone_taken)，供表单校验逐字段报错
    pub async fn uniqueness_conflicts(&self, email: &str, phone: &str) -> Result<(bool, bool)> {
        let row: (bool, bool) = sqlx::query_as(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM customers WHERE email = $1),
                EXISTS (SELECT 1 FROM customers WHERE phone = $2)
            "#,
        )
        .bind(email)
        .bind(phone)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// 当前可用卡号数量
    ///
    /// 号段容量减去号段内已占用的卡号数
    pub async fn avail_cards_count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT (c.card_end - c.card_start + 1)
                 - (SELECT COUNT(*) FROM customers
                    WHERE card BETWEEN c.card_start AND c.card_end)
            FROM site_config c
            WHERE c.id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// 分页列出用户
    pub async fn list(
        &self,
        filter: &CustomerFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Customer>, i64)> {
        let (total,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM customers WHERE {}",
            FILTER_WHERE
        ))
        .bind(filter.has_card)
        .bind(filter.email_status)
        .bind(filter.created_from)
        .bind(filter.created_to)
        .bind(filter.insurance_from)
        .bind(filter.insurance_to)
        .fetch_one(&self.pool)
        .await?;

        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {} FROM customers
            WHERE {}
            ORDER BY created_at DESC, id DESC
            LIMIT $7 OFFSET $8
            "#,
            SELECT_COLUMNS, FILTER_WHERE
        ))
        .bind(filter.has_card)
        .bind(filter.email_status)
        .bind(filter.created_from)
        .bind(filter.created_to)
        .bind(filter.insurance_from)
        .bind(filter.insurance_to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((customers, total))
    }

    /// 列出全部符合条件的用户（导出用，不分页）
    pub async fn list_all(&self, filter: &CustomerFilter) -> Result<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {} FROM customers
            WHERE {}
            ORDER BY created_at DESC, id DESC
            "#,
            SELECT_COLUMNS, FILTER_WHERE
        ))
        .bind(filter.has_card)
        .bind(filter.email_status)
        .bind(filter.created_from)
        .bind(filter.created_to)
        .bind(filter.insurance_from)
        .bind(filter.insurance_to)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    // ==================== 写入操作 ====================

    /// 更新用户邮件状态
    pub async fn set_email_status(&self, id: i64, status: EmailStatus) -> Result<()> {
        sqlx::query("UPDATE customers SET email_status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ==================== 事务操作 ====================

    /// 在事务中取出号段内已占用的卡号
    ///
    /// 调用方需先对配置行加锁（见 SiteConfigRepository::get_for_update）
    pub async fn used_cards_in_range_in_tx(
        tx: &mut PgConnection,
        card_start: i64,
        card_end: i64,
    ) -> Result<Vec<i64>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT card FROM customers WHERE card BETWEEN $1 AND $2",
        )
        .bind(card_start)
        .bind(card_end)
        .fetch_all(tx)
        .await?;

        Ok(rows.into_iter().map(|(card,)| card).collect())
    }

    /// 在事务中插入用户
    ///
    /// 唯一约束冲突映射为 AlreadyExists，供上层转成表单错误
    pub async fn insert_in_tx(tx: &mut PgConnection, customer: &NewCustomer) -> Result<Customer> {
        let inserted = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers
                (created_at, first_name, middle_name, last_name, email, phone,
                 insurance_end, card, email_status, utm_link)
            VALUES (COALESCE($1, NOW()), $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(customer.created_at)
        .bind(&customer.first_name)
        .bind(&customer.middle_name)
        .bind(&customer.last_name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(customer.insurance_end)
        .bind(customer.card)
        .bind(customer.email_status)
        .bind(&customer.utm_link)
        .fetch_one(tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    let field = match db.constraint() {
                        Some(c) if c.contains("phone") => "phone",
                        Some(c) if c.contains("card") => "card",
                        _ => "email",
                    };
                    let value = match field {
                        "phone" => customer.phone.clone(),
                        "card" => customer.card.map(|c| c.to_string()).unwrap_or_default(),
                        _ => customer.email.clone(),
                    };
                    return LoyaltyError::AlreadyExists {
                        entity: "Customer".to_string(),
                        field: field.to_string(),
                        value,
                    };
                }
            }
            LoyaltyError::Database(e)
        })?;

        Ok(inserted)
    }

    /// 在事务中删除全部用户
    pub async fn delete_all_in_tx(tx: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query("DELETE FROM customers").execute(tx).await?;
        Ok(result.rows_affected())
    }
}
