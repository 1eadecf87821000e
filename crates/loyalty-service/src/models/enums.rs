//! 枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 确认邮件状态（记录在用户上）
///
/// NotExist 是初始值；Created 仅在导入的历史数据中出现，
/// 正常流程由发送结果直接推进到 Sent 或 Failed。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i32)]
pub enum EmailStatus {
    /// 发送失败 - 邮件传输出错，不自动重试
    Failed = -1,
    /// 不存在 - 尚未尝试发送
    #[default]
    NotExist = 0,
    /// 已创建 - 任务已建立但未发送
    Created = 1,
    /// 已发送 - 邮件已交付传输层
    Sent = 2,
    /// 已打开 - 追踪像素被命中
    Opened = 3,
}

impl EmailStatus {
    /// 人类可读标签，用于导出列与导入匹配
    pub fn display_label(&self) -> &'static str {
        match self {
            Self::Failed => "Sending failed",
            Self::NotExist => "Not created",
            Self::Created => "Created",
            Self::Sent => "Sent",
            Self::Opened => "Opened",
        }
    }

    /// 从显示标签反查状态（导入时使用）
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Sending failed" => Some(Self::Failed),
            "Not created" => Some(Self::NotExist),
            "Created" => Some(Self::Created),
            "Sent" => Some(Self::Sent),
            "Opened" => Some(Self::Opened),
            _ => None,
        }
    }
}

/// 文本块的投放位置
///
/// 同一位置最多一个激活文本，激活新文本会使同位置其余文本失效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum TextPlace {
    /// 信息块
    Info,
    /// 开篇文本
    Intro,
    /// 动员元素
    Motivate,
    /// 页脚文本
    Footer,
    /// 确认邮件正文
    Email,
    /// 注册成功页
    Success,
}

impl TextPlace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Intro => "intro",
            Self::Motivate => "motivate",
            Self::Footer => "footer",
            Self::Email => "email",
            Self::Success => "success",
        }
    }
}

/// 服务项图标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum ServiceImage {
    /// 拖车
    Evac,
    /// 蓄电池
    Accum,
    /// 燃油
    Gas,
    /// 电话咨询
    Call,
}

impl ServiceImage {
    /// 图标文件名（静态资源目录下的固定文件）
    pub fn icon_file(&self) -> &'static str {
        match self {
            Self::Evac => "img/ico_01.png",
            Self::Accum => "img/ico_02.png",
            Self::Gas => "img/ico_03.png",
            Self::Call => "img/ico_04.png",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_status_label_round_trip() {
        for status in [
            EmailStatus::Failed,
            EmailStatus::NotExist,
            EmailStatus::Created,
            EmailStatus::Sent,
            EmailStatus::Opened,
        ] {
            assert_eq!(EmailStatus::from_label(status.display_label()), Some(status));
        }
    }

    #[test]
    fn test_email_status_unknown_label() {
        assert_eq!(EmailStatus::from_label("Delivered"), None);
        assert_eq!(EmailStatus::from_label(""), None);
    }

    #[test]
    fn test_email_status_default() {
        assert_eq!(EmailStatus::default(), EmailStatus::NotExist);
    }

    #[test]
    fn test_email_status_serialization() {
        assert_eq!(
            serde_json::to_string(&EmailStatus::NotExist).unwrap(),
            "\"NOT_EXIST\""
        );
        assert_eq!(
            serde_json::from_str::<EmailStatus>("\"FAILED\"").unwrap(),
            EmailStatus::Failed
        );
    }

    #[test]
    fn test_text_place_as_str() {
        assert_eq!(TextPlace::Email.as_str(), "email");
        assert_eq!(TextPlace::Success.as_str(), "success");
        assert_eq!(
            serde_json::to_string(&TextPlace::Intro).unwrap(),
            "\"intro\""
        );
    }

    #[test]
    fn test_service_image_icon_file() {
        assert_eq!(ServiceImage::Evac.icon_file(), "img/ico_01.png");
        assert_eq!(ServiceImage::Call.icon_file(), "img/ico_04.png");
    }
}
