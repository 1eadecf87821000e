//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use sqlx::PgPool;

use crate::notification::{Mailer, NotificationDispatcher};
use crate::service::{ImportService, SignupService};
use loyalty_shared::config::SiteSettings;

/// 内置 1x1 透明 PNG，站点未配置像素图片时使用
pub const FALLBACK_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG 签名
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15,
    0xC4, 0x89, //
    0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, // IDAT
    0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, //
    0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82, // IEND
];

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL 连接池
    pub pool: PgPool,
    /// 注册服务
    pub signup: Arc<SignupService>,
    /// 确认邮件调度器
    pub dispatcher: Arc<NotificationDispatcher>,
    /// 导入/清空服务
    pub import: Arc<ImportService>,
    /// 导出数据的"来源"常量
    pub data_source: String,
    /// 管理接口共享令牌
    pub admin_token: String,
    /// 追踪像素图片
    pub pixel: Arc<Vec<u8>>,
}

impl AppState {
    /// 创建应用状态
    ///
    /// `pixel` 为 None 时使用内置的 1x1 透明 PNG
    pub fn new(
        pool: PgPool,
        mailer: Arc<dyn Mailer>,
        site: &SiteSettings,
        pixel: Option<Vec<u8>>,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            pool.clone(),
            mailer,
            site.base_url.trim_end_matches('/').to_string(),
        ));
        let signup = Arc::new(SignupService::new(pool.clone(), dispatcher.clone()));
        let import = Arc::new(ImportService::new(pool.clone()));

        Self {
            pool,
            signup,
            dispatcher,
            import,
            data_source: site.data_source.clone(),
            admin_token: site.admin_token.clone(),
            pixel: Arc::new(pixel.unwrap_or_else(|| FALLBACK_PIXEL.to_vec())),
        }
    }
}
