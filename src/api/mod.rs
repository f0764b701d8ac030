// ==========================================
// 剧团排班系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供命令行入口与界面调用
// ==========================================

pub mod assignment_api;
pub mod error;
pub mod schedule_api;

// 重导出核心类型
pub use assignment_api::{AssignmentApi, AutoAssignResponse, MonthlyCount};
pub use error::{ApiError, ApiResult};
pub use schedule_api::{ScheduleApi, VenueStatsReport};
