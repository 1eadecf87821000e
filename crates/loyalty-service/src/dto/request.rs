//! 请求 DTO 定义

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use validator::Validate;

use crate::error::{FieldError, ServiceError};
use crate::models::{EmailStatus, NewCustomer, ServiceImage, TextPlace};

/// 完整姓名：姓、名、父称三个以空白分隔的部分
static FULL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\S+\s+){2}\S+$").unwrap());

/// 手机号：0 开头的 10 位数字
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(crate::models::PHONE_PATTERN).unwrap());

/// 注册表单的日期输入格式
const INSURANCE_DATE_FORMAT: &str = "%m/%d/%Y";

/// 注册表单
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    /// "姓 名 父称"
    #[validate(regex(path = *FULL_NAME_RE, message = "请输入姓、名、父称三部分"))]
    pub full_name: String,
    /// 保险到期日，mm/dd/yyyy
    pub insurance_end: String,
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    #[validate(regex(path = *PHONE_RE, message = "手机号须为 0 开头的 10 位数字"))]
    pub phone: String,
    /// 访客来源链接（由前端透传）
    #[validate(url(message = "UTM 链接格式不正确"))]
    pub utm_link: Option<String>,
}

impl SignupRequest {
    /// 校验并转换为待插入的用户数据
    ///
    /// 卡号与状态留给分配器补齐
    pub fn into_new_customer(self) -> Result<NewCustomer, ServiceError> {
        self.validate()?;

        let insurance_end = NaiveDate::parse_from_str(&self.insurance_end, INSURANCE_DATE_FORMAT)
            .map_err(|_| {
                ServiceError::Form(vec![FieldError::new(
                    "insurance_end",
                    "日期格式须为 mm/dd/yyyy",
                )])
            })?;

        let mut parts = self.full_name.split_whitespace();
        // 正则已保证恰好三段
        let last_name = parts.next().unwrap_or_default().to_string();
        let first_name = parts.next().unwrap_or_default().to_string();
        let middle_name = parts.next().unwrap_or_default().to_string();

        Ok(NewCustomer {
            created_at: None,
            first_name,
            middle_name,
            last_name,
            email: self.email,
            phone: self.phone,
            insurance_end,
            card: None,
            email_status: EmailStatus::NotExist,
            utm_link: self.utm_link,
        })
    }
}

/// 分页参数
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    const MAX_PAGE_SIZE: i64 = 100;

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, Self::MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }
}

/// 清空操作请求，必须显式确认
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleanRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// 站点配置更新请求
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSiteConfigRequest {
    #[validate(range(min = 1, message = "号段起点须为正数"))]
    pub card_start: i64,
    pub card_end: i64,
    #[validate(range(min = 0, message = "阈值不能为负"))]
    pub lower_limit: i64,
    #[validate(range(min = 1, message = "扩段步长须为正数"))]
    pub increase_by: i64,
    #[validate(length(min = 1, max = 255, message = "邮件主题长度须在 1-255 之间"))]
    pub email_subject: String,
}

/// 创建文本块请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTextRequest {
    pub place: TextPlace,
    pub text: String,
    #[serde(default)]
    pub is_active: bool,
}

/// 更新文本块请求
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTextRequest {
    pub text: String,
    pub is_active: bool,
}

/// 创建服务项请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateServiceRequest {
    pub text: String,
    pub image: ServiceImage,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// 更新服务项请求
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateServiceRequest {
    pub text: String,
    pub image: ServiceImage,
    pub sort_order: i32,
    pub is_active: bool,
}
