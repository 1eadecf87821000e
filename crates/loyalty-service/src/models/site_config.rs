//! 站点配置模型

use serde::{Deserialize, Serialize};

/// 站点配置（数据库单例行，id 恒为 1）
///
/// 卡号号段与确认邮件主题。`card_end` 只会被分配器的
/// 扩段操作和管理接口修改。
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SiteConfig {
    pub id: i32,
    /// 号段起点（含）
    pub card_start: i64,
    /// 号段终点（含）
    pub card_end: i64,
    /// 可用卡号降到该值及以下时触发扩段
    pub lower_limit: i64,
    /// 每次扩段增加的数量
    pub increase_by: i64,
    /// 确认邮件主题
    pub email_subject: String,
}

impl SiteConfig {
    /// 号段总容量
    pub fn cards_count(&self) -> i64 {
        self.card_end - self.card_start + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cards_count() {
        let config = SiteConfig {
            id: 1,
            card_start: 1,
            card_end: 200,
            lower_limit: 10,
            increase_by: 200,
            email_subject: "Congratulations!".to_string(),
        };
        assert_eq!(config.cards_count(), 200);
    }

    #[test]
    fn test_cards_count_single_slot() {
        let config = SiteConfig {
            id: 1,
            card_start: 5,
            card_end: 5,
            lower_limit: 0,
            increase_by: 1,
            email_subject: String::new(),
        };
        assert_eq!(config.cards_count(), 1);
    }
}
