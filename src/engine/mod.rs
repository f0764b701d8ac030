// ==========================================
// 剧团排班系统 - 引擎层
// ==========================================
// 职责: 实现自动分配规则
// 红线: Engine 不拼 SQL, 数据读写只经过 AssignmentDataSource
// ==========================================

pub mod auto_assign;
pub mod data_source;
pub mod eligibility;
pub mod eligibility_core;
pub mod error;
pub mod repositories;

// 重导出核心引擎
pub use auto_assign::AutoAssignEngine;
pub use data_source::AssignmentDataSource;
pub use eligibility::EligibilityEngine;
pub use eligibility_core::{EligibilityCore, Ineligibility, MonthRange};
pub use error::{AssignmentError, AssignmentResult};
pub use repositories::RepositoryDataSource;
