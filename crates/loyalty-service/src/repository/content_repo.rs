//! 内容仓储
//!
//! 文本块与服务项的数据访问，维护"同位置唯一激活"约束

use sqlx::PgPool;

use crate::models::{Service, ServiceImage, TextBlock, TextPlace};
use loyalty_shared::error::{LoyaltyError, Result};

const TEXT_COLUMNS: &str = "id, place, is_active, text";
const SERVICE_COLUMNS: &str = "id, text, image, sort_order, is_active";

/// 内容仓储
pub struct ContentRepository {
    pool: PgPool,
}

impl ContentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 文本块 ====================

    /// 获取某位置的激活文本
    pub async fn active_text(&self, place: TextPlace) -> Result<Option<TextBlock>> {
        let text = sqlx::query_as::<_, TextBlock>(&format!(
            "SELECT {} FROM text_blocks WHERE place = $1 AND is_active LIMIT 1",
            TEXT_COLUMNS
        ))
        .bind(place)
        .fetch_optional(&self.pool)
        .await?;

        Ok(text)
    }

    /// 列出全部激活文本
    pub async fn active_texts(&self) -> Result<Vec<TextBlock>> {
        let texts = sqlx::query_as::<_, TextBlock>(&format!(
            "SELECT {} FROM text_blocks WHERE is_active ORDER BY id",
            TEXT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(texts)
    }

    /// 列出全部文本块（管理接口）
    pub async fn list_texts(&self) -> Result<Vec<TextBlock>> {
        let texts = sqlx::query_as::<_, TextBlock>(&format!(
            "SELECT {} FROM text_blocks ORDER BY place, id",
            TEXT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(texts)
    }

    /// 创建文本块
    ///
    /// 激活状态的写入会使同位置其余文本失效，两步在同一事务中完成
    pub async fn create_text(
        &self,
        place: TextPlace,
        text: &str,
        is_active: bool,
    ) -> Result<TextBlock> {
        let mut tx = self.pool.begin().await?;

        if is_active {
            sqlx::query("UPDATE text_blocks SET is_active = FALSE WHERE place = $1")
                .bind(place)
                .execute(&mut *tx)
                .await?;
        }

        let created = sqlx::query_as::<_, TextBlock>(&format!(
            r#"
            INSERT INTO text_blocks (place, is_active, text)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            TEXT_COLUMNS
        ))
        .bind(place)
        .bind(is_active)
        .bind(text)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    /// 更新文本块
    pub async fn update_text(
        &self,
        id: i64,
        text: &str,
        is_active: bool,
    ) -> Result<TextBlock> {
        let mut tx = self.pool.begin().await?;

        if is_active {
            // 先取出位置，再让同位置兄弟失效
            let place: Option<(TextPlace,)> =
                sqlx::query_as("SELECT place FROM text_blocks WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let (place,) = place.ok_or_else(|| LoyaltyError::NotFound {
                entity: "TextBlock".to_string(),
                id: id.to_string(),
            })?;

            sqlx::query("UPDATE text_blocks SET is_active = FALSE WHERE place = $1 AND id <> $2")
                .bind(place)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let updated = sqlx::query_as::<_, TextBlock>(&format!(
            r#"
            UPDATE text_blocks
            SET text = $2, is_active = $3
            WHERE id = $1
            RETURNING {}
            "#,
            TEXT_COLUMNS
        ))
        .bind(id)
        .bind(text)
        .bind(is_active)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| LoyaltyError::NotFound {
            entity: "TextBlock".to_string(),
            id: id.to_string(),
        })?;

        tx.commit().await?;

        Ok(updated)
    }

    // ==================== 服务项 ====================

    /// 列出激活的服务项（按排序值）
    pub async fn active_services(&self) -> Result<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {} FROM services WHERE is_active ORDER BY sort_order, id",
            SERVICE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// 列出全部服务项（管理接口）
    pub async fn list_services(&self) -> Result<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {} FROM services ORDER BY sort_order, id",
            SERVICE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// 创建服务项
    pub async fn create_service(
        &self,
        text: &str,
        image: ServiceImage,
        sort_order: i32,
        is_active: bool,
    ) -> Result<Service> {
        let created = sqlx::query_as::<_, Service>(&format!(
            r#"
            INSERT INTO services (text, image, sort_order, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        ))
        .bind(text)
        .bind(image)
        .bind(sort_order)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// 更新服务项
    pub async fn update_service(
        &self,
        id: i64,
        text: &str,
        image: ServiceImage,
        sort_order: i32,
        is_active: bool,
    ) -> Result<Service> {
        let updated = sqlx::query_as::<_, Service>(&format!(
            r#"
            UPDATE services
            SET text = $2, image = $3, sort_order = $4, is_active = $5
            WHERE id = $1
            RETURNING {}
            "#,
            SERVICE_COLUMNS
        ))
        .bind(id)
        .bind(text)
        .bind(image)
        .bind(sort_order)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| LoyaltyError::NotFound {
            entity: "Service".to_string(),
            id: id.to_string(),
        })?;

        Ok(updated)
    }
}
