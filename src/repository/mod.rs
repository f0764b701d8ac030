// ==========================================
// 剧团排班系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub(crate) mod columns;
pub mod assignment_repo;
pub mod error;
pub mod member_repo;
pub mod performance_repo;
pub mod personal_leave_repo;
pub mod schedule_repo;

// 重导出核心仓储
pub use assignment_repo::AssignmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use member_repo::MemberRepository;
pub use performance_repo::PerformanceRepository;
pub use personal_leave_repo::PersonalLeaveRepository;
pub use schedule_repo::ScheduleRepository;
