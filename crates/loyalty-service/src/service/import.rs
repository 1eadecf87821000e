//! 用户批量导入
//!
//! 解析上传的 XLSX 工作簿并整体替换用户数据。
//! 所有行错误在任何删除动作之前收集并汇总上报；
//! 删除与插入在同一事务中完成，中途失败不会留下空表。

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::LazyLock;

use calamine::{Data, Reader, Xlsx};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use sqlx::PgPool;
use tracing::{info, instrument};

use crate::models::{EmailStatus, NewCustomer};
use crate::repository::{CustomerRepository, EmailTaskRepository};
use loyalty_shared::error::Result;

/// 卡号列的匹配模式：取末尾连续数字（"UV 42" -> 42）
static CARD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^.*?(\d+)$").unwrap());

/// 导入列顺序（与 XLSX 导出一致，外加被丢弃的"来源"列）
const COLUMNS: usize = 11;

/// 解析整个工作簿
///
/// 返回解析出的用户行；任何一行出错都会让整个导入被拒绝，
/// 错误按行号汇总返回。
pub fn parse_workbook(bytes: &[u8]) -> std::result::Result<Vec<NewCustomer>, Vec<String>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| vec![format!("无法读取工作簿: {e}")])?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| vec!["工作簿中没有工作表".to_string()])?
        .map_err(|e| vec![format!("无法读取工作表: {e}")])?;

    let mut customers = Vec::new();
    let mut errors = Vec::new();
    let mut seen_emails = HashSet::new();

    for (idx, row) in range.rows().enumerate() {
        let line = idx + 1;
        match parse_row(row) {
            Ok(customer) => {
                // 文件内部的重复邮箱同样会撞唯一约束，提前报出来
                if !seen_emails.insert(customer.email.clone()) {
                    errors.push(format!("行 {line}: 邮箱重复: {}", customer.email));
                } else {
                    customers.push(customer);
                }
            }
            Err(e) => errors.push(format!("行 {line}: {e}")),
        }
    }

    if errors.is_empty() {
        Ok(customers)
    } else {
        Err(errors)
    }
}

/// 解析一行
fn parse_row(row: &[Data]) -> std::result::Result<NewCustomer, String> {
    let cell = |i: usize| row.get(i).unwrap_or(&Data::Empty);

    if row.iter().all(|c| matches!(c, Data::Empty)) {
        return Err("空行".to_string());
    }
    if row.len() > COLUMNS {
        return Err(format!("列数超出预期: {}", row.len()));
    }

    let created_at = parse_created_at(cell(0))?;
    let card = parse_card(cell(1))?;
    let last_name = required_string(cell(2), "姓")?;
    let first_name = required_string(cell(3), "名")?;
    let middle_name = required_string(cell(4), "父称")?;
    let email = required_string(cell(5), "邮箱")?;
    let phone = required_string(cell(6), "手机号")?;
    let insurance_end = parse_date(cell(7)).ok_or("保险到期日无法解析")?;
    let email_status = parse_email_status(cell(8))?;
    // 第 9 列"来源"是导出时附带的常量，导入时丢弃
    let utm_link = optional_string(cell(10));

    Ok(NewCustomer {
        created_at,
        first_name,
        middle_name,
        last_name,
        email,
        phone,
        insurance_end,
        card,
        email_status,
        utm_link,
    })
}

/// 解析卡号列
///
/// 空单元格表示无卡；字符串取末尾数字；匹配不到数字即格式错误
fn parse_card(cell: &Data) -> std::result::Result<Option<i64>, String> {
    match cell {
        Data::Empty => Ok(None),
        Data::Int(n) => Ok(Some(*n)),
        Data::Float(f) => Ok(Some(*f as i64)),
        Data::String(s) if s.trim().is_empty() => Ok(None),
        Data::String(s) => {
            let captures = CARD_RE
                .captures(s.trim())
                .ok_or_else(|| format!("卡号格式不正确: {s}"))?;
            captures[1]
                .parse::<i64>()
                .map(Some)
                .map_err(|_| format!("卡号数值超出范围: {s}"))
        }
        other => Err(format!("卡号格式不正确: {other}")),
    }
}

/// 解析邮件状态列（按显示标签匹配）
fn parse_email_status(cell: &Data) -> std::result::Result<EmailStatus, String> {
    match cell {
        Data::Empty => Err("缺少邮件状态".to_string()),
        Data::String(s) => {
            EmailStatus::from_label(s.trim()).ok_or_else(|| format!("未知的邮件状态: {s}"))
        }
        other => Err(format!("未知的邮件状态: {other}")),
    }
}

/// 解析注册时间列（可空，空值落库时取 NOW()）
fn parse_created_at(cell: &Data) -> std::result::Result<Option<DateTime<Utc>>, String> {
    match cell {
        Data::Empty => Ok(None),
        Data::String(s) if s.trim().is_empty() => Ok(None),
        Data::String(s) => {
            let s = s.trim();
            for format in ["%Y-%m-%d %H:%M:%S", "%d.%m.%Y %H:%M:%S", "%d.%m.%Y %H:%M"] {
                if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, format) {
                    return Ok(Some(dt.and_utc()));
                }
            }
            // 纯日期也接受
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Ok(Some(date.and_hms_opt(0, 0, 0).unwrap().and_utc()));
            }
            Err(format!("注册时间无法解析: {s}"))
        }
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|naive| Some(naive.and_utc()))
            .ok_or_else(|| "注册时间无法解析".to_string()),
        other => Err(format!("注册时间无法解析: {other}")),
    }
}

/// 解析日期单元格
fn parse_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|naive| naive.date()),
        Data::String(s) => {
            let s = s.trim();
            ["%Y-%m-%d", "%d.%m.%Y"]
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        }
        _ => None,
    }
}

fn required_string(cell: &Data, label: &str) -> std::result::Result<String, String> {
    match cell {
        Data::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(format!("缺少{label}")),
    }
}

fn optional_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// 导入服务
pub struct ImportService {
    pool: PgPool,
}

impl ImportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 整体替换用户数据
    ///
    /// 删除全部邮件任务与用户后批量插入，全程单事务：
    /// 任一插入失败则回滚，旧数据保持原样。
    /// 导入的数据不分配卡号、不创建邮件任务。
    #[instrument(skip(self, customers), fields(count = customers.len()))]
    pub async fn replace_all(&self, customers: &[NewCustomer]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let removed_tasks = EmailTaskRepository::delete_all_in_tx(&mut tx).await?;
        let removed_customers = CustomerRepository::delete_all_in_tx(&mut tx).await?;

        let mut inserted = 0u64;
        for customer in customers {
            CustomerRepository::insert_in_tx(&mut tx, customer).await?;
            inserted += 1;
        }

        tx.commit().await?;

        info!(
            removed_tasks,
            removed_customers, inserted, "导入完成，数据已整体替换"
        );

        Ok(inserted)
    }

    /// 清空全部用户与邮件任务（管理端"清零"操作）
    #[instrument(skip(self))]
    pub async fn clean(&self) -> Result<(u64, u64)> {
        let mut tx = self.pool.begin().await?;

        let removed_tasks = EmailTaskRepository::delete_all_in_tx(&mut tx).await?;
        let removed_customers = CustomerRepository::delete_all_in_tx(&mut tx).await?;

        tx.commit().await?;

        info!(removed_tasks, removed_customers, "数据已清空");

        Ok((removed_tasks, removed_customers))
    }
}
