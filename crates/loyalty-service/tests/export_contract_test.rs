//! 导出/导入契约测试
//!
//! 列顺序与状态标签是对外契约：CRM 按列位置取数，
//! 导入按显示标签反查状态。这里从公共 API 层锁定整个闭环，
//! 不需要数据库。

use chrono::{NaiveDate, TimeZone, Utc};

use loyalty_service::export::{CustomerCsvFormatter, CustomerXlsxFormatter};
use loyalty_service::models::{Customer, EmailStatus};
use loyalty_service::service::parse_workbook;

fn customer(id: i64, card: Option<i64>, status: EmailStatus) -> Customer {
    Customer {
        id,
        created_at: Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap(),
        first_name: format!("Name{id}"),
        middle_name: format!("Middle{id}"),
        last_name: format!("Last{id}"),
        email: format!("user{id}@contract.test"),
        phone: format!("06000000{id:02}"),
        insurance_end: NaiveDate::from_ymd_opt(2025, 11, 20).unwrap(),
        card,
        email_status: status,
        utm_link: None,
    }
}

#[test]
fn test_csv_header_contract() {
    let bytes = CustomerCsvFormatter::new("landing")
        .format(&[])
        .unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(
        text.trim_end(),
        "Lead name;Mobile phone;Private e-mail;Insurance end date;Card number;\
         Card valid since;Card valid till;Source;Channel"
    );
}

#[test]
fn test_xlsx_round_trip_preserves_all_statuses() {
    let statuses = [
        EmailStatus::Failed,
        EmailStatus::NotExist,
        EmailStatus::Created,
        EmailStatus::Sent,
        EmailStatus::Opened,
    ];
    let customers: Vec<Customer> = statuses
        .iter()
        .enumerate()
        .map(|(i, status)| customer(i as i64 + 1, Some(100 + i as i64), *status))
        .collect();

    let bytes = CustomerXlsxWriterHelper::format(&customers);
    let parsed = parse_workbook(&bytes).expect("导出文件应可原样导回");

    assert_eq!(parsed.len(), statuses.len());
    for (parsed_row, status) in parsed.iter().zip(statuses) {
        // 状态标签闭环：导出标签 → 导入反查
        assert_eq!(parsed_row.email_status, status);
    }
    assert_eq!(parsed[0].card, Some(100));
    assert_eq!(parsed[0].last_name, "Last1");
    assert_eq!(
        parsed[0].insurance_end,
        NaiveDate::from_ymd_opt(2025, 11, 20).unwrap()
    );
}

#[test]
fn test_import_rejects_whole_file_on_single_bad_row() {
    let mut customers: Vec<Customer> = (1..=3)
        .map(|i| customer(i, Some(200 + i), EmailStatus::Sent))
        .collect();
    customers[1].card = None;

    let bytes = CustomerXlsxWriterHelper::format(&customers);

    // 在合法文件上篡改一格：把第三行的状态改成未知标签
    // （rust_xlsxwriter 输出不便原位修改，这里直接重建带坏行的文件）
    use rust_xlsxwriter::Workbook;
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let parsed = parse_workbook(&bytes).unwrap();
    for (r, row) in parsed.iter().enumerate() {
        let status_label = if r == 2 {
            "Delivered" // 未知标签
        } else {
            row.email_status.display_label()
        };
        let cells = [
            "2025-03-10 09:00:00".to_string(),
            row.card.map(|c| format!("UV {c}")).unwrap_or_default(),
            row.last_name.clone(),
            row.first_name.clone(),
            row.middle_name.clone(),
            row.email.clone(),
            row.phone.clone(),
            row.insurance_end.format("%Y-%m-%d").to_string(),
            status_label.to_string(),
            "landing".to_string(),
            String::new(),
        ];
        for (c, value) in cells.into_iter().enumerate() {
            worksheet.write_string(r as u32, c as u16, value).unwrap();
        }
    }
    let tampered = workbook.save_to_buffer().unwrap();

    let errors = parse_workbook(&tampered).unwrap_err();
    // 单行坏数据导致整个文件被拒绝
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("行 3"));
    assert!(errors[0].contains("Delivered"));
}

/// 统一出口，避免每个测试重复构造 formatter
struct CustomerXlsxWriterHelper;

impl CustomerXlsxWriterHelper {
    fn format(customers: &[Customer]) -> Vec<u8> {
        CustomerXlsxFormatter::new("landing")
            .format(customers)
            .expect("XLSX 导出失败")
    }
}
