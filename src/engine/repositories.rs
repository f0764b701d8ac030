// ==========================================
// 剧团排班系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合自动分配所需的 Repository, 实现 AssignmentDataSource
// 时间: 所有日期换算统一使用注入的 VenueClock
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::assignment::{Assignment, RoleBinding};
use crate::domain::member::Member;
use crate::domain::performance::Performance;
use crate::domain::schedule::Schedule;
use crate::domain::types::VenueClock;
use crate::engine::data_source::AssignmentDataSource;
use crate::repository::{
    AssignmentRepository, MemberRepository, PerformanceRepository, PersonalLeaveRepository,
    RepositoryResult, ScheduleRepository,
};

/// 自动分配仓储集合
///
/// # 包含的仓储
/// - `performance_repo`: 剧目
/// - `member_repo`: 团员及可出演角色
/// - `schedule_repo`: 场次
/// - `assignment_repo`: 分配
/// - `leave_repo`: 个人请假
#[derive(Clone)]
pub struct RepositoryDataSource {
    pub performance_repo: Arc<PerformanceRepository>,
    pub member_repo: Arc<MemberRepository>,
    pub schedule_repo: Arc<ScheduleRepository>,
    pub assignment_repo: Arc<AssignmentRepository>,
    pub leave_repo: Arc<PersonalLeaveRepository>,
    clock: VenueClock,
}

impl RepositoryDataSource {
    /// 创建新的仓储集合
    pub fn new(
        performance_repo: Arc<PerformanceRepository>,
        member_repo: Arc<MemberRepository>,
        schedule_repo: Arc<ScheduleRepository>,
        assignment_repo: Arc<AssignmentRepository>,
        leave_repo: Arc<PersonalLeaveRepository>,
        clock: VenueClock,
    ) -> Self {
        Self {
            performance_repo,
            member_repo,
            schedule_repo,
            assignment_repo,
            leave_repo,
            clock,
        }
    }

    /// 替换场馆时区 (每次运行按最新配置构造)
    pub fn with_clock(mut self, clock: VenueClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> &VenueClock {
        &self.clock
    }
}

impl AssignmentDataSource for RepositoryDataSource {
    fn list_schedules_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Schedule>> {
        self.schedule_repo
            .list_by_call_date_range(&self.clock, start, end)
    }

    fn list_auto_assign_members(&self) -> RepositoryResult<Vec<Member>> {
        self.member_repo.list_auto_assign()
    }

    fn find_performance(&self, performance_id: i64) -> RepositoryResult<Option<Performance>> {
        self.performance_repo.find_by_id(performance_id)
    }

    fn list_same_day_schedules(&self, schedule: &Schedule) -> RepositoryResult<Vec<Schedule>> {
        self.schedule_repo.list_same_day(&self.clock, schedule)
    }

    fn find_available_roles(
        &self,
        member_id: i64,
        performance_id: i64,
    ) -> RepositoryResult<Option<Vec<String>>> {
        self.member_repo
            .find_available_roles(member_id, performance_id)
    }

    fn count_member_assignments(
        &self,
        member_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<u32> {
        self.assignment_repo
            .count_for_member_between(&self.clock, member_id, start, end)
    }

    fn has_personal_leave(&self, member_id: i64, date: NaiveDate) -> RepositoryResult<bool> {
        self.leave_repo.exists(member_id, date)
    }

    fn list_manual_assignments(&self, schedule_id: i64) -> RepositoryResult<Vec<Assignment>> {
        self.assignment_repo.list_manual_by_schedule(schedule_id)
    }

    fn clear_auto_assignments(&self, schedule_id: i64) -> RepositoryResult<usize> {
        self.assignment_repo.delete_auto_by_schedule(schedule_id)
    }

    fn save_auto_assignments(
        &self,
        schedule_id: i64,
        bindings: &[RoleBinding],
    ) -> RepositoryResult<()> {
        self.assignment_repo.insert_auto_batch(schedule_id, bindings)
    }
}
