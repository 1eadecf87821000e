//! 用户管理 API 处理器
//!
//! 列表/筛选、导出、导入、清空与邮件任务查询

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, instrument};

use crate::dto::{ApiResponse, CleanRequest, CustomerDto, EmailTaskDto, PageResponse, PaginationParams};
use crate::error::ServiceError;
use crate::export::{CustomerCsvFormatter, CustomerXlsxFormatter, ExportFormat};
use crate::repository::{CustomerFilter, CustomerRepository, EmailTaskRepository};
use crate::service::parse_workbook;
use crate::state::AppState;

/// 用户列表
///
/// GET /api/admin/customers
///
/// 支持按持卡、邮件状态、注册时间与保险到期日筛选
#[instrument(skip(state))]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<CustomerFilter>,
) -> Result<Json<ApiResponse<PageResponse<CustomerDto>>>, ServiceError> {
    let repo = CustomerRepository::new(state.pool.clone());
    let (customers, total) = repo
        .list(&filter, pagination.offset(), pagination.limit())
        .await?;

    let items = customers.into_iter().map(CustomerDto::from).collect();

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit(),
    ))))
}

/// 导出用户
///
/// GET /api/admin/customers/export/{fmt}
///
/// fmt ∈ {csv, xlsx}，未知格式返回 404。
/// 应用与列表相同的筛选条件，导出完整结果集（不分页）。
#[instrument(skip(state))]
pub async fn export_customers(
    State(state): State<AppState>,
    Path(fmt): Path<String>,
    Query(filter): Query<CustomerFilter>,
) -> Result<Response, ServiceError> {
    let format = ExportFormat::parse(&fmt).ok_or(ServiceError::UnknownFormat(fmt))?;

    let customers = CustomerRepository::new(state.pool.clone())
        .list_all(&filter)
        .await?;

    let bytes = match format {
        ExportFormat::Csv => CustomerCsvFormatter::new(&state.data_source).format(&customers)?,
        ExportFormat::Xlsx => CustomerXlsxFormatter::new(&state.data_source).format(&customers)?,
    };

    info!(count = customers.len(), format = ?format, "用户数据已导出");

    let filename = format!(
        "customers_{}.{}",
        Utc::now().format("%Y_%m_%d_%H_%M"),
        format.extension()
    );

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// 导入用户
///
/// POST /api/admin/customers/import
///
/// multipart 上传 XLSX。所有行错误在任何删除动作前汇总返回 400；
/// 校验通过后在一个事务里整体替换用户与邮件任务数据。
#[instrument(skip(state, multipart))]
pub async fn import_customers(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    let mut payload: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::Validation(format!("上传内容无法解析: {e}")))?
    {
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::Validation(format!("读取上传文件失败: {e}")))?;
        payload = Some(bytes.to_vec());
    }

    let payload = payload.ok_or_else(|| ServiceError::Validation("缺少上传文件".to_string()))?;

    let customers = parse_workbook(&payload).map_err(ServiceError::ImportRejected)?;

    let inserted = state.import.replace_all(&customers).await?;

    Ok(Json(ApiResponse::success_with_message(
        serde_json::json!({ "imported": inserted }),
        format!("导入完成，共 {inserted} 条记录"),
    )))
}

/// 清空用户与邮件任务
///
/// POST /api/admin/customers/clean
///
/// 破坏性操作，必须显式传 {"confirm": true}
#[instrument(skip(state, request))]
pub async fn clean_customers(
    State(state): State<AppState>,
    Json(request): Json<CleanRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ServiceError> {
    if !request.confirm {
        return Err(ServiceError::ConfirmationRequired);
    }

    let (removed_tasks, removed_customers) = state.import.clean().await?;

    Ok(Json(ApiResponse::success_with_message(
        serde_json::json!({
            "removedCustomers": removed_customers,
            "removedTasks": removed_tasks
        }),
        "数据已清空",
    )))
}

/// 邮件任务列表
///
/// GET /api/admin/email-tasks
#[instrument(skip(state))]
pub async fn list_email_tasks(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PageResponse<EmailTaskDto>>>, ServiceError> {
    let repo = EmailTaskRepository::new(state.pool.clone());
    let (tasks, total) = repo.list(pagination.offset(), pagination.limit()).await?;

    let items = tasks.into_iter().map(EmailTaskDto::from).collect();

    Ok(Json(ApiResponse::success(PageResponse::new(
        items,
        total,
        pagination.page,
        pagination.limit(),
    ))))
}
