//! 用户模型

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::EmailStatus;

/// 手机号格式：0 开头的 10 位数字
pub const PHONE_PATTERN: &str = r"^0\d{9}$";

/// 卡片标签前缀
const CARD_PREFIX: &str = "UV";

/// 注册用户
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub insurance_end: NaiveDate,
    /// 卡号，号段耗尽时为空
    pub card: Option<i64>,
    pub email_status: EmailStatus,
    pub utm_link: Option<String>,
}

impl Customer {
    /// 完整姓名："姓 名 父称"
    pub fn full_name(&self) -> String {
        format!("{} {} {}", self.last_name, self.first_name, self.middle_name)
    }

    /// 卡片标签（"UV <n>"），未分配卡号时为空字符串
    pub fn card_name(&self) -> String {
        match self.card {
            Some(card) => format!("{} {}", CARD_PREFIX, card),
            None => String::new(),
        }
    }

    /// 卡片生效日期：注册次日
    pub fn card_valid_since(&self) -> NaiveDate {
        self.created_at.date_naive() + Days::new(1)
    }

    /// 卡片失效日期：生效日起三个月
    pub fn card_valid_till(&self) -> NaiveDate {
        self.card_valid_since() + Months::new(3)
    }
}

/// 待插入的用户数据
///
/// 注册表单和导入流程共用；卡号与邮件状态由调用方按场景补齐。
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub created_at: Option<DateTime<Utc>>,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub insurance_end: NaiveDate,
    pub card: Option<i64>,
    pub email_status: EmailStatus,
    pub utm_link: Option<String>,
}
