//! 数据导出模块
//!
//! 把筛选后的用户全集格式化为下载文件。
//! 目前支持 CSV 与 XLSX 两种格式，列顺序是对外契约的一部分。

mod customer;

pub use customer::{CustomerCsvFormatter, CustomerXlsxFormatter, ExportFormat};
