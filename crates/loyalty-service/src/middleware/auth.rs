//! 管理接口认证中间件
//!
//! 校验请求中的 Bearer Token 是否与配置的管理令牌一致。
//! 后台是单租户运维入口，不做用户/角色体系；
//! 校验失败返回带说明的 403 响应而非裸错误页。

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

/// 管理接口认证中间件
///
/// 从 Authorization header 提取 Bearer Token 与共享令牌比对
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return forbidden_response("缺少管理令牌，请在 Authorization 头携带 Bearer Token");
        }
    };

    if token != state.admin_token {
        warn!(path = %request.uri().path(), "管理令牌校验失败");
        return forbidden_response("管理令牌不正确，无权执行该操作");
    }

    next.run(request).await
}

/// 生成 403 禁止访问响应
fn forbidden_response(message: &str) -> Response {
    let body = json!({
        "success": false,
        "code": "FORBIDDEN",
        "message": message,
        "data": null
    });

    (StatusCode::FORBIDDEN, axum::Json(body)).into_response()
}
