//! 站点配置 API 处理器

use axum::{Json, extract::State};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::{ApiResponse, SiteConfigDto, UpdateSiteConfigRequest};
use crate::error::ServiceError;
use crate::models::SiteConfig;
use crate::repository::{CustomerRepository, SiteConfigRepository};
use crate::state::AppState;

/// 获取站点配置
///
/// GET /api/admin/config
///
/// 附带只读的当前可用卡号数
#[instrument(skip(state))]
pub async fn get_config(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SiteConfigDto>>, ServiceError> {
    let config = SiteConfigRepository::new(state.pool.clone()).get().await?;
    let cards_available = CustomerRepository::new(state.pool.clone())
        .avail_cards_count()
        .await?;

    Ok(Json(ApiResponse::success(SiteConfigDto::from_config(
        config,
        cards_available,
    ))))
}

/// 更新站点配置
///
/// PUT /api/admin/config
#[instrument(skip(state, request))]
pub async fn update_config(
    State(state): State<AppState>,
    Json(request): Json<UpdateSiteConfigRequest>,
) -> Result<Json<ApiResponse<SiteConfigDto>>, ServiceError> {
    request.validate()?;

    let repo = SiteConfigRepository::new(state.pool.clone());
    let updated = repo
        .update(&SiteConfig {
            id: 1,
            card_start: request.card_start,
            card_end: request.card_end,
            lower_limit: request.lower_limit,
            increase_by: request.increase_by,
            email_subject: request.email_subject,
        })
        .await?;

    info!(
        card_start = updated.card_start,
        card_end = updated.card_end,
        "站点配置已更新"
    );

    let cards_available = CustomerRepository::new(state.pool.clone())
        .avail_cards_count()
        .await?;

    Ok(Json(ApiResponse::success(SiteConfigDto::from_config(
        updated,
        cards_available,
    ))))
}
