//! HTTP 处理器模块

pub mod config_admin;
pub mod content_admin;
pub mod customer_admin;
pub mod public;
