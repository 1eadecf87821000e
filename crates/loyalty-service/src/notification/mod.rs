//! 确认邮件模块
//!
//! 注册确认邮件的渲染、发送与打开追踪。
//! 邮件传输通过 `Mailer` trait 抽象，生产环境接 SMTP，测试用 Mock。

mod dispatcher;
mod mailer;
mod template;

pub use dispatcher::{NotificationDispatcher, TOKEN_LENGTH, generate_token};
pub use mailer::{EmailMessage, Mailer, MockMailer, SmtpMailer};
pub use template::TemplateEngine;
