//! 路由配置模块
//!
//! 定义公开端点与管理 API 的路由映射

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{handlers, state::AppState};

/// 构建公开路由（无需认证）
///
/// 落地页、注册表单与追踪像素
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::public::landing))
        .route("/", post(handlers::public::signup))
        .route("/opened/", get(handlers::public::email_opened))
}

/// 构建用户管理路由
///
/// 列表/筛选、导出、导入、清空与邮件任务查询
fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(handlers::customer_admin::list_customers))
        .route(
            "/customers/export/{fmt}",
            get(handlers::customer_admin::export_customers),
        )
        .route(
            "/customers/import",
            post(handlers::customer_admin::import_customers),
        )
        .route(
            "/customers/clean",
            post(handlers::customer_admin::clean_customers),
        )
        .route(
            "/email-tasks",
            get(handlers::customer_admin::list_email_tasks),
        )
}

/// 构建站点配置路由
fn config_routes() -> Router<AppState> {
    Router::new()
        .route("/config", get(handlers::config_admin::get_config))
        .route("/config", put(handlers::config_admin::update_config))
}

/// 构建内容管理路由
///
/// 文本块与落地页服务项维护
fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/texts", get(handlers::content_admin::list_texts))
        .route("/texts", post(handlers::content_admin::create_text))
        .route("/texts/{id}", put(handlers::content_admin::update_text))
        .route("/services", get(handlers::content_admin::list_services))
        .route("/services", post(handlers::content_admin::create_service))
        .route(
            "/services/{id}",
            put(handlers::content_admin::update_service),
        )
}

/// 构建完整的管理 API 路由
///
/// 返回全部后台路由（不含前缀与认证层，由调用方在 main.rs 中挂载）
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .merge(customer_routes())
        .merge(config_routes())
        .merge(content_routes())
}
