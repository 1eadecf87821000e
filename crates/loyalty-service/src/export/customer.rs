//! 用户数据导出格式化
//!
//! CSV 面向外部 CRM 对接（分号分隔、带表头、dd.mm.yyyy 日期），
//! XLSX 面向后台人工查看，两者列集不同且顺序固定。

use chrono::NaiveDate;
use rust_xlsxwriter::Workbook;

use crate::models::Customer;
use loyalty_shared::error::{LoyaltyError, Result};

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// 从 URL 片段解析格式，未知格式返回 None（上层映射为 404）
    pub fn parse(fmt: &str) -> Option<Self> {
        match fmt {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

/// CSV 表头（对接方按列名取数，顺序与行内容严格一致）
const CSV_HEADER: [&str; 9] = [
    "Lead name",
    "Mobile phone",
    "Private e-mail",
    "Insurance end date",
    "Card number",
    "Card valid since",
    "Card valid till",
    "Source",
    "Channel",
];

fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// CSV 导出器
pub struct CustomerCsvFormatter {
    data_source: String,
}

impl CustomerCsvFormatter {
    pub fn new(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
        }
    }

    fn row(&self, customer: &Customer) -> [String; 9] {
        [
            customer.full_name(),
            customer.phone.clone(),
            customer.email.clone(),
            format_date(customer.insurance_end),
            customer.card_name(),
            format_date(customer.card_valid_since()),
            format_date(customer.card_valid_till()),
            self.data_source.clone(),
            customer.utm_link.clone().unwrap_or_default(),
        ]
    }

    /// 格式化为分号分隔的 CSV 字节流
    pub fn format(&self, customers: &[Customer]) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_writer(Vec::new());

        writer
            .write_record(CSV_HEADER)
            .map_err(|e| LoyaltyError::Internal(format!("CSV 写入失败: {e}")))?;

        for customer in customers {
            writer
                .write_record(self.row(customer))
                .map_err(|e| LoyaltyError::Internal(format!("CSV 写入失败: {e}")))?;
        }

        writer
            .into_inner()
            .map_err(|e| LoyaltyError::Internal(format!("CSV 写入失败: {e}")))
    }
}

/// XLSX 导出器
///
/// 列顺序与导入解析一一对应，导出文件可原样导回
pub struct CustomerXlsxFormatter {
    data_source: String,
}

impl CustomerXlsxFormatter {
    pub fn new(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
        }
    }

    fn row(&self, customer: &Customer) -> [String; 11] {
        [
            customer.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            customer.card_name(),
            customer.last_name.clone(),
            customer.first_name.clone(),
            customer.middle_name.clone(),
            customer.email.clone(),
            customer.phone.clone(),
            customer.insurance_end.format("%Y-%m-%d").to_string(),
            customer.email_status.display_label().to_string(),
            self.data_source.clone(),
            customer.utm_link.clone().unwrap_or_default(),
        ]
    }

    /// 格式化为 XLSX 字节流
    pub fn format(&self, customers: &[Customer]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (i, customer) in customers.iter().enumerate() {
            for (j, value) in self.row(customer).into_iter().enumerate() {
                worksheet
                    .write_string(i as u32, j as u16, value)
                    .map_err(|e| LoyaltyError::Internal(format!("XLSX 写入失败: {e}")))?;
            }
        }

        workbook
            .save_to_buffer()
            .map_err(|e| LoyaltyError::Internal(format!("XLSX 写入失败: {e}")))
    }
}
