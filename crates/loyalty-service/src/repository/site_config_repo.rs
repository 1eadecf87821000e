//! 站点配置仓储
//!
//! 单例配置行的读取、更新与号段原子扩展

use sqlx::{PgConnection, PgPool};

use crate::models::SiteConfig;
use loyalty_shared::error::{LoyaltyError, Result};

/// 站点配置仓储
///
/// 配置行 id 恒为 1。分配事务中通过 `get_for_update` 取行级锁，
/// 串行化并发的卡号分配。
pub struct SiteConfigRepository {
    pool: PgPool,
}

const SELECT_COLUMNS: &str = "id, card_start, card_end, lower_limit, increase_by, email_subject";

impl SiteConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 读取配置
    pub async fn get(&self) -> Result<SiteConfig> {
        let config = sqlx::query_as::<_, SiteConfig>(&format!(
            "SELECT {} FROM site_config WHERE id = 1",
            SELECT_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| LoyaltyError::NotFound {
            entity: "SiteConfig".to_string(),
            id: "1".to_string(),
        })?;

        Ok(config)
    }

    /// 更新配置（管理接口）
    pub async fn update(&self, config: &SiteConfig) -> Result<SiteConfig> {
        if config.card_end < config.card_start {
            return Err(LoyaltyError::Validation(
                "card_end 不能小于 card_start".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, SiteConfig>(&format!(
            r#"
            UPDATE site_config
            SET card_start = $1, card_end = $2, lower_limit = $3,
                increase_by = $4, email_subject = $5
            WHERE id = 1
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(config.card_start)
        .bind(config.card_end)
        .bind(config.lower_limit)
        .bind(config.increase_by)
        .bind(&config.email_subject)
        .fetch_one(&self.pool)
        .await?;

        Ok(updated)
    }

    // ==================== 事务操作 ====================

    /// 在事务中读取配置（带行级锁）
    ///
    /// FOR UPDATE 锁住单例行，后续的扫描与扩段对并发注册互斥
    pub async fn get_for_update(tx: &mut PgConnection) -> Result<SiteConfig> {
        let config = sqlx::query_as::<_, SiteConfig>(&format!(
            "SELECT {} FROM site_config WHERE id = 1 FOR UPDATE",
            SELECT_COLUMNS
        ))
        .fetch_optional(tx)
        .await?
        .ok_or_else(|| LoyaltyError::NotFound {
            entity: "SiteConfig".to_string(),
            id: "1".to_string(),
        })?;

        Ok(config)
    }

    /// 在事务中原子扩展号段终点
    ///
    /// 数据库侧自增，避免读取-修改-写回竞态
    pub async fn extend_card_end_in_tx(tx: &mut PgConnection, increase_by: i64) -> Result<i64> {
        let (card_end,): (i64,) = sqlx::query_as(
            r#"
            UPDATE site_config
            SET card_end = card_end + $1
            WHERE id = 1
            RETURNING card_end
            "#,
        )
        .bind(increase_by)
        .fetch_one(tx)
        .await?;

        Ok(card_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_from_env() -> Option<PgPool> {
        std::env::var("DATABASE_URL")
            .ok()
            .map(|url| PgPool::connect_lazy(&url).expect("连接池创建失败"))
    }

    #[tokio::test]
    #[ignore] // 需要数据库连接
    async fn test_get_and_extend() {
        let pool = pool_from_env().expect("DATABASE_URL must be set");
        let repo = SiteConfigRepository::new(pool.clone());
        let before = repo.get().await.unwrap();

        let mut tx = pool.begin().await.unwrap();
        let end = SiteConfigRepository::extend_card_end_in_tx(&mut tx, 10)
            .await
            .unwrap();
        assert_eq!(end, before.card_end + 10);
        // 回滚，不污染数据
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    #[ignore] // 需要数据库连接
    async fn test_update_rejects_inverted_range() {
        let pool = pool_from_env().expect("DATABASE_URL must be set");
        let repo = SiteConfigRepository::new(pool);
        let mut config = repo.get().await.unwrap();
        config.card_start = 100;
        config.card_end = 50;
        let err = repo.update(&config).await.unwrap_err();
        assert!(matches!(err, LoyaltyError::Validation(_)));
    }
}
