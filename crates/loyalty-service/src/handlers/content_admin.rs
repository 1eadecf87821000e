//! 内容管理 API 处理器
//!
//! 文本块与落地页服务项的维护

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::dto::{ApiResponse, CreateServiceRequest, CreateTextRequest, UpdateServiceRequest, UpdateTextRequest};
use crate::error::ServiceError;
use crate::models::{Service, TextBlock};
use crate::repository::ContentRepository;
use crate::state::AppState;

// ==================== 文本块 ====================

/// 文本块列表
///
/// GET /api/admin/texts
#[instrument(skip(state))]
pub async fn list_texts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TextBlock>>>, ServiceError> {
    let texts = ContentRepository::new(state.pool.clone()).list_texts().await?;
    Ok(Json(ApiResponse::success(texts)))
}

/// 创建文本块
///
/// POST /api/admin/texts
///
/// 带激活标记的创建会让同位置其余文本失效
#[instrument(skip(state, request))]
pub async fn create_text(
    State(state): State<AppState>,
    Json(request): Json<CreateTextRequest>,
) -> Result<Json<ApiResponse<TextBlock>>, ServiceError> {
    let created = ContentRepository::new(state.pool.clone())
        .create_text(request.place, &request.text, request.is_active)
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

/// 更新文本块
///
/// PUT /api/admin/texts/{id}
#[instrument(skip(state, request))]
pub async fn update_text(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateTextRequest>,
) -> Result<Json<ApiResponse<TextBlock>>, ServiceError> {
    let updated = ContentRepository::new(state.pool.clone())
        .update_text(id, &request.text, request.is_active)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

// ==================== 服务项 ====================

/// 服务项列表
///
/// GET /api/admin/services
#[instrument(skip(state))]
pub async fn list_services(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Service>>>, ServiceError> {
    let services = ContentRepository::new(state.pool.clone())
        .list_services()
        .await?;
    Ok(Json(ApiResponse::success(services)))
}

/// 创建服务项
///
/// POST /api/admin/services
#[instrument(skip(state, request))]
pub async fn create_service(
    State(state): State<AppState>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, ServiceError> {
    let created = ContentRepository::new(state.pool.clone())
        .create_service(
            &request.text,
            request.image,
            request.sort_order,
            request.is_active,
        )
        .await?;
    Ok(Json(ApiResponse::success(created)))
}

/// 更新服务项
///
/// PUT /api/admin/services/{id}
#[instrument(skip(state, request))]
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, ServiceError> {
    let updated = ContentRepository::new(state.pool.clone())
        .update_service(
            id,
            &request.text,
            request.image,
            request.sort_order,
            request.is_active,
        )
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}
