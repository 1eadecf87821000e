//! 邮件任务模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::EmailStatus;

/// 确认邮件任务
///
/// 每个用户在正常流程中只有一条任务记录。
/// `opened_at` 一经写入不再变更（追踪像素幂等）。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmailTask {
    pub id: i64,
    pub customer_id: i64,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    /// 12 位字母数字追踪令牌
    pub token: String,
}

impl EmailTask {
    /// 派生任务状态，优先级：已打开 > 已发送 > 已创建
    pub fn status(&self) -> EmailStatus {
        if self.opened_at.is_some() {
            EmailStatus::Opened
        } else if self.sent_at.is_some() {
            EmailStatus::Sent
        } else {
            EmailStatus::Created
        }
    }
}
