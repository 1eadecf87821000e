//! 会员卡服务
//!
//! 提供会员注册、卡号发放、确认邮件与后台管理等功能。
//!
//! ## 核心功能
//!
//! - **会员注册**：落地页表单提交，校验后写入用户记录
//! - **卡号分配**：在配置的号段内发放唯一卡号，余量不足时自动扩展号段
//! - **确认邮件**：注册后渲染模板发送确认邮件，带打开追踪像素
//! - **后台管理**：用户列表/筛选、导出（CSV/XLSX）、导入、清空，
//!   以及站点配置、文本块与服务项维护
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `repository`: 数据库仓储层
//! - `service`: 业务服务层（卡号分配、注册流程、导入）
//! - `notification`: 确认邮件模块（模板、发送、追踪）
//! - `export`: 用户数据导出格式化
//! - `handlers`: HTTP 处理器
//! - `middleware`: 管理接口认证中间件
//! - `routes`: 路由配置
//! - `state`: 应用共享状态

pub mod dto;
pub mod error;
pub mod export;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notification;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

pub use error::{Result, ServiceError};
pub use models::*;
pub use notification::{
    EmailMessage, Mailer, MockMailer, NotificationDispatcher, SmtpMailer, TemplateEngine,
};
pub use repository::{
    ContentRepository, CustomerRepository, EmailTaskRepository, SiteConfigRepository,
};
pub use service::{CardAllocator, ImportService, SignupService};
