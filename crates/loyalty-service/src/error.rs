//! 服务错误类型定义
//!
//! 包含 Web 层所有错误类型及其 HTTP 响应映射

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use loyalty_shared::LoyaltyError;

/// 表单字段错误
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// 服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    // 验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),
    #[error("表单校验未通过")]
    Form(Vec<FieldError>),

    // 资源不存在
    #[error("资源不存在: {0}")]
    NotFound(String),
    #[error("未知的导出格式: {0}")]
    UnknownFormat(String),

    // 权限错误
    #[error("禁止访问: {0}")]
    Forbidden(String),

    // 业务错误
    #[error("导入被拒绝，共 {} 处错误", .0.len())]
    ImportRejected(Vec<String>),
    #[error("危险操作需要显式确认")]
    ConfirmationRequired,

    // 系统错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ServiceError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Form(_) => StatusCode::BAD_REQUEST,
            Self::ImportRejected(_) | Self::ConfirmationRequired => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::UnknownFormat(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Form(_) => "FORM_INVALID",
            Self::NotFound(_) => "NOT_FOUND",
            Self::UnknownFormat(_) => "UNKNOWN_FORMAT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::ImportRejected(_) => "IMPORT_REJECTED",
            Self::ConfirmationRequired => "CONFIRMATION_REQUIRED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志，防止信息泄露
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        // 字段级和行级错误附在 data 中，便于前端逐项展示
        let data = match &self {
            Self::Form(fields) => json!({ "errors": fields }),
            Self::ImportRejected(rows) => json!({ "errors": rows }),
            _ => serde_json::Value::Null,
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": data
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    FieldError::new(field.to_string(), message)
                })
            })
            .collect();
        Self::Form(fields)
    }
}

/// 从共享错误转换
impl From<LoyaltyError> for ServiceError {
    fn from(err: LoyaltyError) -> Self {
        match err {
            LoyaltyError::Database(e) => Self::Database(e),
            LoyaltyError::NotFound { entity, id } => Self::NotFound(format!("{} {}", entity, id)),
            LoyaltyError::AlreadyExists { field, value, .. } => Self::Form(vec![FieldError::new(
                field,
                format!("该值已被占用: {}", value),
            )]),
            LoyaltyError::Validation(msg) => Self::Validation(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ServiceError>;
