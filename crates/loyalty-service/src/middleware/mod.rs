//! 中间件模块

mod auth;

pub use auth::admin_auth;
