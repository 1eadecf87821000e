//! 内容实体模型
//!
//! 文本块与落地页服务项。文本块同时为确认邮件和成功页提供模板正文。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Customer;
use super::enums::{ServiceImage, TextPlace};

/// 文本块
///
/// 按位置槽投放的富文本片段，正文支持 `{{variable}}` 占位符
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TextBlock {
    pub id: i64,
    pub place: TextPlace,
    pub is_active: bool,
    pub text: String,
}

impl TextBlock {
    /// 构建模板渲染上下文
    ///
    /// 可用变量：last_name、first_name、middle_name、phone、email、card
    pub fn template_context(customer: &Customer) -> HashMap<String, String> {
        let mut ctx = HashMap::new();
        ctx.insert("last_name".to_string(), customer.last_name.clone());
        ctx.insert("first_name".to_string(), customer.first_name.clone());
        ctx.insert("middle_name".to_string(), customer.middle_name.clone());
        ctx.insert("phone".to_string(), customer.phone.clone());
        ctx.insert("email".to_string(), customer.email.clone());
        ctx.insert("card".to_string(), customer.card_name());
        ctx
    }
}

/// 落地页服务项
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: i64,
    pub text: String,
    pub image: ServiceImage,
    pub sort_order: i32,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmailStatus;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_template_context_variables() {
        let customer = Customer {
            id: 7,
            created_at: Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
            first_name: "Anna".to_string(),
            middle_name: "Petrovna".to_string(),
            last_name: "Sidorova".to_string(),
            email: "anna@example.com".to_string(),
            phone: "0509998877".to_string(),
            insurance_end: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            card: Some(15),
            email_status: EmailStatus::NotExist,
            utm_link: None,
        };

        let ctx = TextBlock::template_context(&customer);
        assert_eq!(ctx["last_name"], "Sidorova");
        assert_eq!(ctx["card"], "UV 15");
        assert_eq!(ctx.len(), 6);
    }
}
