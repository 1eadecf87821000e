//! 业务服务层
//!
//! 卡号分配、注册流程与批量导入

mod allocator;
mod import;
mod signup;

pub use allocator::{CardAllocator, pick_free_card, should_extend};
pub use import::{ImportService, parse_workbook};
pub use signup::{SignupOutcome, SignupService};
