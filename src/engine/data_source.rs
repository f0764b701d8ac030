// ==========================================
// 剧团排班系统 - 自动分配数据访问接口
// ==========================================
// 红线: Engine 不拼 SQL, 只通过此接口读写
// 实现者: RepositoryDataSource (SQLite 仓储聚合)
// ==========================================

use crate::domain::assignment::{Assignment, RoleBinding};
use crate::domain::member::Member;
use crate::domain::performance::Performance;
use crate::domain::schedule::Schedule;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;

/// 自动分配引擎所需的数据访问能力
///
/// 所有日期均为场馆本地日期; 时区换算由实现方负责
pub trait AssignmentDataSource {
    // ===== 读取 =====

    /// 场馆本地日期落在 [start, end] 内的场次 (按集合时间升序)
    fn list_schedules_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Schedule>>;

    /// 参与自动分配的团员 (按姓名升序)
    fn list_auto_assign_members(&self) -> RepositoryResult<Vec<Member>>;

    fn find_performance(&self, performance_id: i64) -> RepositoryResult<Option<Performance>>;

    /// 同剧目、同日期的其他场次 (不含自身, 按集合时间升序)
    fn list_same_day_schedules(&self, schedule: &Schedule) -> RepositoryResult<Vec<Schedule>>;

    /// 团员在剧目中可出演的角色; None 表示无记录
    fn find_available_roles(
        &self,
        member_id: i64,
        performance_id: i64,
    ) -> RepositoryResult<Option<Vec<String>>>;

    /// 团员在 [start, end] 内已落库的分配数 (自动 + 手动)
    fn count_member_assignments(
        &self,
        member_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<u32>;

    fn has_personal_leave(&self, member_id: i64, date: NaiveDate) -> RepositoryResult<bool>;

    fn list_manual_assignments(&self, schedule_id: i64) -> RepositoryResult<Vec<Assignment>>;

    // ===== 写入 =====

    /// 删除场次的自动分配, 返回删除行数
    fn clear_auto_assignments(&self, schedule_id: i64) -> RepositoryResult<usize>;

    /// 写入场次的自动分配 (全部成功或全部不写)
    fn save_auto_assignments(
        &self,
        schedule_id: i64,
        bindings: &[RoleBinding],
    ) -> RepositoryResult<()>;
}
