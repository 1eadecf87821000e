//! 响应 DTO 定义
//!
//! 所有 REST API 的响应体结构

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{Customer, EmailStatus, EmailTask, Service, SiteConfig};

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: "操作成功".to_string(),
            data: Some(data),
        }
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

/// 分页响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> PageResponse<T> {
    /// 创建分页响应
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };

        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

/// 用户响应 DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDto {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub card_name: String,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: String,
    pub email: String,
    pub phone: String,
    pub insurance_end: NaiveDate,
    pub email_status: EmailStatus,
    pub email_status_label: &'static str,
    pub utm_link: Option<String>,
}

impl From<Customer> for CustomerDto {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            created_at: customer.created_at,
            card_name: customer.card_name(),
            email_status_label: customer.email_status.display_label(),
            last_name: customer.last_name,
            first_name: customer.first_name,
            middle_name: customer.middle_name,
            email: customer.email,
            phone: customer.phone,
            insurance_end: customer.insurance_end,
            email_status: customer.email_status,
            utm_link: customer.utm_link,
        }
    }
}

/// 邮件任务响应 DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTaskDto {
    pub id: i64,
    pub customer_id: i64,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub status: EmailStatus,
    pub status_label: &'static str,
}

impl From<EmailTask> for EmailTaskDto {
    fn from(task: EmailTask) -> Self {
        let status = task.status();
        Self {
            id: task.id,
            customer_id: task.customer_id,
            created_at: task.created_at,
            sent_at: task.sent_at,
            opened_at: task.opened_at,
            status,
            status_label: status.display_label(),
        }
    }
}

/// 落地页服务项 DTO
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDto {
    pub id: i64,
    pub text: String,
    pub icon: &'static str,
    pub sort_order: i32,
}

impl From<Service> for ServiceDto {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            icon: service.image.icon_file(),
            text: service.text,
            sort_order: service.sort_order,
        }
    }
}

/// 落地页数据
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingDto {
    /// 激活的文本块，按投放位置键入
    pub texts: HashMap<String, String>,
    pub services: Vec<ServiceDto>,
    pub cards_available: i64,
}

/// 注册结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResultDto {
    pub customer_id: i64,
    pub card_name: String,
    pub email_status: EmailStatus,
    /// 成功页文案（没有激活的 success 文本时为 null）
    pub message: Option<String>,
}

/// 站点配置响应（附带只读的可用卡号数）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfigDto {
    pub card_start: i64,
    pub card_end: i64,
    pub lower_limit: i64,
    pub increase_by: i64,
    pub email_subject: String,
    pub cards_available: i64,
}

impl SiteConfigDto {
    pub fn from_config(config: SiteConfig, cards_available: i64) -> Self {
        Self {
            card_start: config.card_start,
            card_end: config.card_end,
            lower_limit: config.lower_limit,
            increase_by: config.increase_by,
            email_subject: config.email_subject,
            cards_available,
        }
    }
}
