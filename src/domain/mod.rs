// ==========================================
// 剧团排班系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与值类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod assignment;
pub mod member;
pub mod performance;
pub mod schedule;
pub mod types;

// 重导出核心类型
pub use assignment::{
    Assignment, AssignmentView, ManualAssignmentInput, RoleBinding, ScheduleResult,
};
pub use member::{Member, MemberPerformance, NewMember, PersonalLeave, DEFAULT_MAX_MONTHLY};
pub use performance::{NewPerformance, Performance};
pub use schedule::{NewSchedule, Schedule, ScheduleStatus, VenueStats};
pub use types::{TimeRange, VenueClock};
