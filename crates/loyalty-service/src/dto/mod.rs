//! DTO 模块
//!
//! 包含所有请求和响应的数据传输对象

pub mod request;
pub mod response;

pub use request::{
    CleanRequest, CreateServiceRequest, CreateTextRequest, PaginationParams, SignupRequest,
    UpdateServiceRequest, UpdateSiteConfigRequest, UpdateTextRequest,
};
pub use response::{
    ApiResponse, CustomerDto, EmailTaskDto, LandingDto, PageResponse, ServiceDto, SignupResultDto,
    SiteConfigDto,
};
