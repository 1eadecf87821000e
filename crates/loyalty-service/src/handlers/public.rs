//! 公开接口处理器
//!
//! 落地页数据、注册表单提交与邮件打开追踪像素

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::dto::{ApiResponse, LandingDto, ServiceDto, SignupRequest, SignupResultDto};
use crate::error::{FieldError, ServiceError};
use crate::repository::{ContentRepository, CustomerRepository};
use crate::state::AppState;

/// 落地页数据
///
/// GET /
///
/// 返回激活的文本块（按位置键入）、服务项列表和当前可用卡号数
#[instrument(skip(state))]
pub async fn landing(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<LandingDto>>, ServiceError> {
    let content = ContentRepository::new(state.pool.clone());
    let customers = CustomerRepository::new(state.pool.clone());

    let texts = content
        .active_texts()
        .await?
        .into_iter()
        .map(|block| (block.place.as_str().to_string(), block.text))
        .collect();

    let services = content
        .active_services()
        .await?
        .into_iter()
        .map(ServiceDto::from)
        .collect();

    let cards_available = customers.avail_cards_count().await?;

    Ok(Json(ApiResponse::success(LandingDto {
        texts,
        services,
        cards_available,
    })))
}

/// 提交注册表单
///
/// POST /
///
/// 校验失败与邮箱/手机号重复返回 400 并逐字段报错；
/// 成功时返回卡片标签与成功页文案
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<ApiResponse<SignupResultDto>>, ServiceError> {
    let new_customer = request.into_new_customer()?;

    // 先做占用检查以便同时报出两个字段；竞态漏网由唯一约束兜底
    let (email_taken, phone_taken) = state
        .signup
        .uniqueness_conflicts(&new_customer.email, &new_customer.phone)
        .await?;

    let mut conflicts = Vec::new();
    if email_taken {
        conflicts.push(FieldError::new("email", "该邮箱已注册"));
    }
    if phone_taken {
        conflicts.push(FieldError::new("phone", "该手机号已注册"));
    }
    if !conflicts.is_empty() {
        return Err(ServiceError::Form(conflicts));
    }

    let outcome = state.signup.register(new_customer).await?;

    Ok(Json(ApiResponse::success(SignupResultDto {
        customer_id: outcome.customer.id,
        card_name: outcome.customer.card_name(),
        email_status: outcome.customer.email_status,
        message: outcome.message,
    })))
}

/// 追踪像素查询参数
#[derive(Debug, Deserialize)]
pub struct PixelParams {
    #[serde(default)]
    pub token: Option<String>,
}

/// 邮件打开追踪像素
///
/// GET /opened/?token=<12 位字母数字>
///
/// 无论令牌是否有效都返回占位 PNG；状态变更只在首次命中发生
#[instrument(skip(state, params))]
pub async fn email_opened(
    State(state): State<AppState>,
    Query(params): Query<PixelParams>,
) -> Response {
    if let Some(token) = params.token.as_deref() {
        // 追踪失败不能影响像素响应，错误只记日志
        if let Err(e) = state.dispatcher.mark_opened(token).await {
            tracing::error!(error = %e, "处理追踪像素命中失败");
        }
    }

    (
        [(header::CONTENT_TYPE, "image/png")],
        state.pixel.as_ref().clone(),
    )
        .into_response()
}

/// 存活探针：服务进程正常即返回 ok
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "loyalty-service"
    }))
}

/// 就绪探针：检查数据库连接是否可用
pub async fn readiness_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();

    Json(serde_json::json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "service": "loyalty-service",
        "checks": {
            "database": if db_ok { "ok" } else { "fail" }
        }
    }))
}
