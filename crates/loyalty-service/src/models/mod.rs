//! 领域模型定义
//!
//! 包含用户、邮件任务、站点配置与内容实体的模型

mod content;
mod customer;
mod email_task;
mod enums;
mod site_config;

pub use content::{Service, TextBlock};
pub use customer::{Customer, NewCustomer, PHONE_PATTERN};
pub use email_task::EmailTask;
pub use enums::{EmailStatus, ServiceImage, TextPlace};
pub use site_config::SiteConfig;
