//! 数据库仓储层
//!
//! 所有 SQL 访问集中在这里，服务层只操作领域模型

mod content_repo;
mod customer_repo;
mod email_task_repo;
mod site_config_repo;

pub use content_repo::ContentRepository;
pub use customer_repo::{CustomerFilter, CustomerRepository};
pub use email_task_repo::EmailTaskRepository;
pub use site_config_repo::SiteConfigRepository;
