//! 会员卡服务入口
//!
//! 提供落地页注册、卡号发放、确认邮件与后台管理 REST API。

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware, routing::get};
use loyalty_service::middleware::admin_auth;
use loyalty_service::notification::SmtpMailer;
use loyalty_service::{handlers, routes, state::AppState};
use loyalty_shared::{config::AppConfig, database::Database, observability};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 统一加载配置：config/*.toml + LOYALTY_ 前缀环境变量
    let config = AppConfig::load("loyalty-service").unwrap_or_default();

    observability::init(&config.observability)?;

    info!("Starting loyalty-service on {}", config.server_addr());

    // 管理令牌：生产环境必须改掉默认值
    if config.site.admin_token == loyalty_shared::config::SiteSettings::default().admin_token {
        if config.is_production() {
            panic!("LOYALTY_SITE_ADMIN_TOKEN must be set in production environment");
        }
        warn!("Using default admin token - set LOYALTY_SITE_ADMIN_TOKEN for production");
    }

    // 初始化基础设施
    let db = Database::connect(&config.database).await?;

    sqlx::migrate!("../../migrations").run(db.pool()).await?;
    info!("Database migrations applied");

    let mailer = Arc::new(SmtpMailer::from_config(&config.mail)?);

    // 追踪像素：优先使用配置的图片文件，缺省用内置 1x1 透明 PNG
    let pixel = match &config.site.pixel_path {
        Some(path) => match tokio::fs::read(path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path, error = %e, "像素图片读取失败，使用内置占位图");
                None
            }
        },
        None => None,
    };

    let state = AppState::new(db.pool().clone(), mailer, &config.site, pixel);

    // CORS：落地页与后台前端跨域访问
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::public_routes())
        .nest(
            "/api/admin",
            routes::admin_routes()
                // 认证中间件：校验管理令牌
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth)),
        )
        .route("/health", get(handlers::public::health_check))
        .route("/ready", get(handlers::public::readiness_check))
        .layer(cors)
        // 可观测性中间件：请求级别的结构化日志
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM（K8s 停止 Pod）或 Ctrl+C 时，
    // 停止接收新连接并等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// 监听关闭信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
/// 收到任一信号后返回，触发 axum 的优雅关闭流程。
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("注册 Ctrl+C 处理器失败");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("注册 SIGTERM 处理器失败")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
