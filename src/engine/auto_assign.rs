// ==========================================
// 剧团排班系统 - 自动分配引擎
// ==========================================
// 职责: 为目标月份的每个场次填充角色
// 输入: 年/月
// 输出: 按处理顺序的场次结果 (Vec<ScheduleResult>)
// 红线: 手动分配永不被覆盖; 同一场次内角色/团员均不重复
// 红线: 单场次失败不影响其余场次
// ==========================================

use crate::domain::assignment::{RoleBinding, ScheduleResult};
use crate::domain::member::Member;
use crate::domain::performance::Performance;
use crate::domain::schedule::Schedule;
use crate::engine::data_source::AssignmentDataSource;
use crate::engine::eligibility::EligibilityEngine;
use crate::engine::eligibility_core::{EligibilityCore, MonthRange};
use crate::engine::error::{AssignmentError, AssignmentResult};
use crate::i18n::{t, t_with_args};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ==========================================
// RunState - 单次运行状态
// ==========================================
// counts: 本次运行内的分配计数 (不读取历史)
// teams: (日期, 剧目) -> (角色 -> 团员), 即当日班底
struct RunState {
    counts: HashMap<i64, u32>,
    teams: HashMap<(NaiveDate, i64), HashMap<String, i64>>,
}

impl RunState {
    fn new(members: &[Member]) -> Self {
        Self {
            counts: members.iter().map(|m| (m.id, 0)).collect(),
            teams: HashMap::new(),
        }
    }

    fn count_of(&self, member_id: i64) -> u32 {
        self.counts.get(&member_id).copied().unwrap_or(0)
    }
}

/// 单场次角色分配结果
struct RoleOutcome {
    bindings: Vec<RoleBinding>,
    manual_filled: usize,
}

// ==========================================
// AutoAssignEngine - 自动分配引擎
// ==========================================
pub struct AutoAssignEngine<S>
where
    S: AssignmentDataSource,
{
    source: Arc<S>,
    eligibility: EligibilityEngine<S>,
}

impl<S> AutoAssignEngine<S>
where
    S: AssignmentDataSource,
{
    pub fn new(source: Arc<S>) -> Self {
        let eligibility = EligibilityEngine::new(source.clone());
        Self {
            source,
            eligibility,
        }
    }

    /// 执行目标月份的自动分配
    ///
    /// # 前置条件 (不满足时在任何写库前返回错误)
    /// - month ∈ 1..=12
    /// - 当月至少一个场次
    /// - 至少一个参与自动分配的团员
    ///
    /// # 返回
    /// 按集合时间顺序的场次结果; 单场次的错误体现在结果中
    #[instrument(skip(self))]
    pub fn run(&self, year: i32, month: u32) -> AssignmentResult<Vec<ScheduleResult>> {
        let range =
            MonthRange::new(year, month).ok_or(AssignmentError::InvalidMonth { year, month })?;

        let mut schedules = self.source.list_schedules_in_range(range.first, range.last)?;
        if schedules.is_empty() {
            return Err(AssignmentError::NoSchedulesInRange { year, month });
        }

        let members: Vec<Member> = self
            .source
            .list_auto_assign_members()?
            .into_iter()
            .filter(|m| m.auto_assign)
            .collect();
        if members.is_empty() {
            return Err(AssignmentError::NoEligibleMembers);
        }

        // 稳定排序: 集合时间相同的场次保持数据源顺序
        schedules.sort_by(|a, b| a.call_time.cmp(&b.call_time));

        info!(
            month = %range,
            schedule_count = schedules.len(),
            member_count = members.len(),
            "开始自动分配"
        );

        let mut state = RunState::new(&members);
        let mut results = Vec::with_capacity(schedules.len());
        for schedule in schedules {
            let result = self.process_schedule(schedule, &members, &range, &mut state);
            results.push(result);
        }

        let success_count = results.iter().filter(|r| r.success).count();
        info!(
            month = %range,
            success_count,
            failure_count = results.len() - success_count,
            "自动分配完成"
        );

        Ok(results)
    }

    // ==========================================
    // 单场次处理
    // ==========================================

    fn process_schedule(
        &self,
        schedule: Schedule,
        members: &[Member],
        range: &MonthRange,
        state: &mut RunState,
    ) -> ScheduleResult {
        let schedule_id = schedule.id;

        // 1. 清除旧的自动分配 (手动分配保留)
        match self.source.clear_auto_assignments(schedule_id) {
            Ok(cleared) if cleared > 0 => {
                debug!(schedule_id, cleared, "已清除旧自动分配");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(schedule_id, error = %e, "清除自动分配失败");
                return ScheduleResult::failed(schedule, None, e.to_string());
            }
        }

        // 2. 解析剧目
        let performance = match self.source.find_performance(schedule.performance_id) {
            Ok(Some(p)) => p,
            Ok(None) => {
                warn!(
                    schedule_id,
                    performance_id = schedule.performance_id,
                    "场次引用的剧目不存在"
                );
                let message = t_with_args(
                    "assignment.performance_not_found",
                    &[("id", &schedule.performance_id.to_string())],
                );
                return ScheduleResult::failed(schedule, None, message);
            }
            Err(e) => {
                warn!(schedule_id, error = %e, "读取剧目失败");
                return ScheduleResult::failed(schedule, None, e.to_string());
            }
        };

        // 3. 角色分配
        let outcome = match self.assign_roles(&schedule, &performance, members, range, state) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(schedule_id, error = %e, "角色分配失败");
                return ScheduleResult::failed(schedule, Some(performance), e.to_string());
            }
        };

        if outcome.bindings.is_empty() && outcome.manual_filled == 0 {
            debug!(schedule_id, "无任何角色被分配");
            return ScheduleResult::failed(
                schedule,
                Some(performance),
                t("assignment.no_eligible_member"),
            );
        }

        // 4. 落库 (单事务), 成功后再累加计数
        if let Err(e) = self.source.save_auto_assignments(schedule_id, &outcome.bindings) {
            warn!(schedule_id, error = %e, "保存自动分配失败");
            return ScheduleResult::failed(schedule, Some(performance), e.to_string());
        }

        for binding in &outcome.bindings {
            *state.counts.entry(binding.member_id).or_insert(0) += 1;
        }

        debug!(
            schedule_id,
            auto_filled = outcome.bindings.len(),
            manual_filled = outcome.manual_filled,
            "场次分配完成"
        );
        ScheduleResult::succeeded(schedule, performance, outcome.bindings)
    }

    /// 按剧目角色顺序逐个选人
    fn assign_roles(
        &self,
        schedule: &Schedule,
        performance: &Performance,
        members: &[Member],
        range: &MonthRange,
        state: &mut RunState,
    ) -> RepositoryResult<RoleOutcome> {
        let manual = self.source.list_manual_assignments(schedule.id)?;
        let manual_roles: HashSet<&str> = manual.iter().map(|a| a.role.as_str()).collect();
        let mut used: HashSet<i64> = manual.iter().map(|a| a.member_id).collect();

        let has_same_day = !self.source.list_same_day_schedules(schedule)?.is_empty();
        let team_key = EligibilityCore::team_key(schedule);

        let mut bindings = Vec::new();
        let mut manual_filled = 0;
        let mut seen_roles: HashSet<&str> = HashSet::new();
        let mut role_cache: HashMap<i64, Option<Vec<String>>> = HashMap::new();

        for role in &performance.roles {
            // 重复的角色名只处理一次 (受 (schedule_id, role) 唯一约束)
            if !seen_roles.insert(role.as_str()) {
                continue;
            }
            if manual_roles.contains(role.as_str()) {
                manual_filled += 1;
                continue;
            }

            let mut chosen: Option<&Member> = None;

            // 同日场次优先沿用当日班底
            if has_same_day {
                let team_member_id = state
                    .teams
                    .get(&team_key)
                    .and_then(|team| team.get(role))
                    .copied();
                if let Some(member_id) = team_member_id {
                    if let Some(member) = members.iter().find(|m| m.id == member_id) {
                        let roles =
                            self.available_roles(&mut role_cache, member.id, performance.id)?;
                        if !used.contains(&member.id)
                            && EligibilityCore::role_allowed(roles.as_deref(), role)
                            && self.eligibility.can_assign(member, schedule, range)?
                        {
                            debug!(schedule_id = schedule.id, role = %role, member_id, "沿用当日班底");
                            chosen = Some(member);
                        }
                    }
                }
            }

            if chosen.is_none() {
                let mut candidates: Vec<&Member> = Vec::new();
                for member in members {
                    if used.contains(&member.id) {
                        continue;
                    }
                    let roles = self.available_roles(&mut role_cache, member.id, performance.id)?;
                    if !EligibilityCore::role_allowed(roles.as_deref(), role) {
                        continue;
                    }
                    if self.eligibility.can_assign(member, schedule, range)? {
                        candidates.push(member);
                    }
                }

                // 稳定排序: 计数相同时保持姓名顺序
                candidates.sort_by_key(|m| state.count_of(m.id));
                chosen = candidates.first().copied();
            }

            let Some(member) = chosen else {
                debug!(schedule_id = schedule.id, role = %role, "无可分配团员, 角色留空");
                continue;
            };

            state
                .teams
                .entry(team_key)
                .or_default()
                .insert(role.clone(), member.id);
            used.insert(member.id);
            bindings.push(RoleBinding {
                member_id: member.id,
                member_name: member.name.clone(),
                role: role.clone(),
            });
        }

        Ok(RoleOutcome {
            bindings,
            manual_filled,
        })
    }

    /// 团员在剧目中可出演的角色 (单场次内缓存)
    fn available_roles<'c>(
        &self,
        cache: &'c mut HashMap<i64, Option<Vec<String>>>,
        member_id: i64,
        performance_id: i64,
    ) -> RepositoryResult<&'c Option<Vec<String>>> {
        Ok(match cache.entry(member_id) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                e.insert(self.source.find_available_roles(member_id, performance_id)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assignment::Assignment;
    use crate::domain::types::TimeRange;
    use crate::repository::error::RepositoryError;
    use chrono::{NaiveDateTime, Weekday};
    use std::cell::{Cell, RefCell};

    // ==========================================
    // 内存数据源
    // ==========================================

    #[derive(Default)]
    struct InMemorySource {
        performances: Vec<Performance>,
        members: Vec<Member>,
        schedules: Vec<Schedule>,
        roles: HashMap<(i64, i64), Vec<String>>,
        leaves: HashSet<(i64, NaiveDate)>,
        assignments: RefCell<Vec<Assignment>>,
        next_id: Cell<i64>,
        fail_save_for: Option<i64>,
    }

    impl InMemorySource {
        fn schedule(&self, id: i64) -> Option<&Schedule> {
            self.schedules.iter().find(|s| s.id == id)
        }

        fn push_assignment(&self, schedule_id: i64, member_id: i64, role: &str, is_manual: bool) {
            let id = self.next_id.get() + 1;
            self.next_id.set(id);
            self.assignments.borrow_mut().push(Assignment {
                id,
                schedule_id,
                member_id,
                role: role.to_string(),
                is_manual,
            });
        }

        fn rows_for(&self, schedule_id: i64) -> Vec<(String, i64, bool)> {
            let mut rows: Vec<_> = self
                .assignments
                .borrow()
                .iter()
                .filter(|a| a.schedule_id == schedule_id)
                .map(|a| (a.role.clone(), a.member_id, a.is_manual))
                .collect();
            rows.sort();
            rows
        }
    }

    impl AssignmentDataSource for InMemorySource {
        fn list_schedules_in_range(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> RepositoryResult<Vec<Schedule>> {
            let mut list: Vec<Schedule> = self
                .schedules
                .iter()
                .filter(|s| (start..=end).contains(&s.call_date()))
                .cloned()
                .collect();
            list.sort_by(|a, b| a.call_time.cmp(&b.call_time));
            Ok(list)
        }

        fn list_auto_assign_members(&self) -> RepositoryResult<Vec<Member>> {
            let mut list: Vec<Member> =
                self.members.iter().filter(|m| m.auto_assign).cloned().collect();
            list.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(list)
        }

        fn find_performance(&self, performance_id: i64) -> RepositoryResult<Option<Performance>> {
            Ok(self
                .performances
                .iter()
                .find(|p| p.id == performance_id)
                .cloned())
        }

        fn list_same_day_schedules(&self, schedule: &Schedule) -> RepositoryResult<Vec<Schedule>> {
            Ok(self
                .schedules
                .iter()
                .filter(|s| {
                    s.id != schedule.id
                        && s.performance_id == schedule.performance_id
                        && s.call_date() == schedule.call_date()
                })
                .cloned()
                .collect())
        }

        fn find_available_roles(
            &self,
            member_id: i64,
            performance_id: i64,
        ) -> RepositoryResult<Option<Vec<String>>> {
            Ok(self.roles.get(&(member_id, performance_id)).cloned())
        }

        fn count_member_assignments(
            &self,
            member_id: i64,
            start: NaiveDate,
            end: NaiveDate,
        ) -> RepositoryResult<u32> {
            let count = self
                .assignments
                .borrow()
                .iter()
                .filter(|a| a.member_id == member_id)
                .filter_map(|a| self.schedule(a.schedule_id))
                .filter(|s| (start..=end).contains(&s.call_date()))
                .count();
            Ok(count as u32)
        }

        fn has_personal_leave(&self, member_id: i64, date: NaiveDate) -> RepositoryResult<bool> {
            Ok(self.leaves.contains(&(member_id, date)))
        }

        fn list_manual_assignments(&self, schedule_id: i64) -> RepositoryResult<Vec<Assignment>> {
            Ok(self
                .assignments
                .borrow()
                .iter()
                .filter(|a| a.schedule_id == schedule_id && a.is_manual)
                .cloned()
                .collect())
        }

        fn clear_auto_assignments(&self, schedule_id: i64) -> RepositoryResult<usize> {
            let mut rows = self.assignments.borrow_mut();
            let before = rows.len();
            rows.retain(|a| !(a.schedule_id == schedule_id && !a.is_manual));
            Ok(before - rows.len())
        }

        fn save_auto_assignments(
            &self,
            schedule_id: i64,
            bindings: &[RoleBinding],
        ) -> RepositoryResult<()> {
            if self.fail_save_for == Some(schedule_id) {
                return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
            }
            for binding in bindings {
                let taken = self
                    .assignments
                    .borrow()
                    .iter()
                    .any(|a| a.schedule_id == schedule_id && a.role == binding.role);
                if taken {
                    return Err(RepositoryError::UniqueConstraintViolation(
                        "assignments.schedule_id, assignments.role".to_string(),
                    ));
                }
            }
            for binding in bindings {
                self.push_assignment(schedule_id, binding.member_id, &binding.role, false);
            }
            Ok(())
        }
    }

    // ==========================================
    // 构造辅助
    // ==========================================

    fn member(id: i64, name: &str) -> Member {
        Member {
            id,
            name: name.to_string(),
            auto_assign: true,
            max_monthly: 10,
            avoid_times: vec![],
            avoid_days: vec![],
            memo: None,
        }
    }

    fn performance(id: i64, roles: &[&str]) -> Performance {
        Performance {
            id,
            name: format!("작품{}", id),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            notes: None,
        }
    }

    fn schedule(id: i64, performance_id: i64, call: &str) -> Schedule {
        let call_time = NaiveDateTime::parse_from_str(call, "%Y-%m-%d %H:%M").unwrap();
        Schedule {
            id,
            performance_id,
            call_time,
            start_time: call_time + chrono::Duration::hours(1),
            venue: "대학로".to_string(),
            status: Default::default(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn allow(source: &mut InMemorySource, member_id: i64, performance_id: i64, roles: &[&str]) {
        source.roles.insert(
            (member_id, performance_id),
            roles.iter().map(|r| r.to_string()).collect(),
        );
    }

    fn bound(result: &ScheduleResult) -> Vec<(&str, i64)> {
        result
            .assignments
            .iter()
            .map(|b| (b.role.as_str(), b.member_id))
            .collect()
    }

    /// 两角色、两团员的基础场景
    fn two_role_source() -> InMemorySource {
        let mut source = InMemorySource {
            performances: vec![performance(1, &["A", "B"])],
            members: vec![member(1, "M1"), member(2, "M2")],
            schedules: vec![schedule(1, 1, "2024-09-03 10:00")],
            ..Default::default()
        };
        allow(&mut source, 1, 1, &["A", "B"]);
        allow(&mut source, 2, 1, &["A", "B"]);
        source
    }

    fn run(source: InMemorySource, year: i32, month: u32) -> (Arc<InMemorySource>, Vec<ScheduleResult>) {
        let source = Arc::new(source);
        let engine = AutoAssignEngine::new(source.clone());
        let results = engine.run(year, month).unwrap();
        (source, results)
    }

    // ==========================================
    // 基础场景
    // ==========================================

    #[test]
    fn test_two_role_example() {
        let (source, results) = run(two_role_source(), 2024, 9);

        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert_eq!(bound(&results[0]), vec![("A", 1), ("B", 2)]);
        assert_eq!(
            source.rows_for(1),
            vec![("A".to_string(), 1, false), ("B".to_string(), 2, false)]
        );
    }

    #[test]
    fn test_tie_break_follows_name_order() {
        let mut source = InMemorySource {
            performances: vec![performance(1, &["A"])],
            members: vec![member(3, "Carol"), member(1, "Alice"), member(2, "Bob")],
            schedules: vec![schedule(1, 1, "2024-09-03 10:00")],
            ..Default::default()
        };
        for id in 1..=3 {
            allow(&mut source, id, 1, &["A"]);
        }

        let (_, results) = run(source, 2024, 9);
        assert_eq!(bound(&results[0]), vec![("A", 1)]);
    }

    #[test]
    fn test_run_counter_spreads_load() {
        let mut source = InMemorySource {
            performances: vec![performance(1, &["A"])],
            members: vec![member(1, "Alice"), member(2, "Bob")],
            schedules: vec![
                schedule(2, 1, "2024-09-04 10:00"),
                schedule(1, 1, "2024-09-03 10:00"),
            ],
            ..Default::default()
        };
        allow(&mut source, 1, 1, &["A"]);
        allow(&mut source, 2, 1, &["A"]);

        let (_, results) = run(source, 2024, 9);
        assert_eq!(results[0].schedule.id, 1);
        assert_eq!(bound(&results[0]), vec![("A", 1)]);
        assert_eq!(bound(&results[1]), vec![("A", 2)]);
    }

    // ==========================================
    // 当日班底
    // ==========================================

    fn same_day_source() -> InMemorySource {
        let mut source = InMemorySource {
            performances: vec![performance(1, &["A", "B"])],
            members: vec![member(1, "Alice"), member(2, "Bob"), member(3, "Carol")],
            schedules: vec![
                schedule(1, 1, "2024-09-07 10:00"),
                schedule(2, 1, "2024-09-07 19:00"),
            ],
            ..Default::default()
        };
        for id in 1..=3 {
            allow(&mut source, id, 1, &["A", "B"]);
        }
        source
    }

    #[test]
    fn test_same_day_schedules_keep_the_team() {
        let (_, results) = run(same_day_source(), 2024, 9);

        assert_eq!(bound(&results[0]), vec![("A", 1), ("B", 2)]);
        // Carol 计数为 0, 但班底优先
        assert_eq!(bound(&results[1]), vec![("A", 1), ("B", 2)]);
    }

    #[test]
    fn test_team_member_ineligible_falls_back_to_counter() {
        let mut source = same_day_source();
        source.members[0].avoid_times = vec![TimeRange::Evening];

        let (_, results) = run(source, 2024, 9);

        assert_eq!(bound(&results[0]), vec![("A", 1), ("B", 2)]);
        assert_eq!(bound(&results[1]), vec![("A", 3), ("B", 2)]);
    }

    #[test]
    fn test_team_is_not_reused_on_other_days() {
        let mut source = same_day_source();
        source.schedules[1] = schedule(2, 1, "2024-09-08 10:00");

        let (_, results) = run(source, 2024, 9);

        // 非同日: 按计数选人, Carol 优先
        assert_eq!(bound(&results[1]), vec![("A", 3), ("B", 1)]);
    }

    #[test]
    fn test_team_is_scoped_to_performance() {
        // 剧目 1 与剧目 2 同日且角色同名; Bob 只能出演剧目 2
        let mut source = InMemorySource {
            performances: vec![performance(1, &["A"]), performance(2, &["A"])],
            members: vec![member(1, "Alice"), member(2, "Bob")],
            schedules: vec![
                schedule(1, 1, "2024-09-03 09:00"),
                schedule(2, 2, "2024-09-03 10:00"),
                schedule(3, 1, "2024-09-03 14:00"),
            ],
            ..Default::default()
        };
        allow(&mut source, 1, 1, &["A"]);
        allow(&mut source, 1, 2, &["A"]);
        allow(&mut source, 2, 2, &["A"]);

        let (_, results) = run(source, 2024, 9);

        assert_eq!(bound(&results[0]), vec![("A", 1)]);
        assert_eq!(bound(&results[1]), vec![("A", 2)]);
        assert_eq!(bound(&results[2]), vec![("A", 1)]);
    }

    // ==========================================
    // 约束
    // ==========================================

    #[test]
    fn test_unfilled_role_is_not_an_error() {
        let mut source = two_role_source();
        source.performances[0] = performance(1, &["A", "B", "C"]);

        let (source, results) = run(source, 2024, 9);

        assert!(results[0].success);
        assert_eq!(bound(&results[0]), vec![("A", 1), ("B", 2)]);
        assert_eq!(source.rows_for(1).len(), 2);
    }

    #[test]
    fn test_zero_filled_roles_is_a_failure() {
        let mut source = two_role_source();
        source.roles.clear();

        let (source, results) = run(source, 2024, 9);

        assert!(!results[0].success);
        assert!(results[0].error.is_some());
        assert!(results[0].performance.is_some());
        assert!(source.rows_for(1).is_empty());
    }

    #[test]
    fn test_avoided_day_and_leave_are_respected() {
        let mut source = two_role_source();
        // 2024-09-03 为周二
        source.members[0].avoid_days = vec![Weekday::Tue];
        source.leaves.insert((2, date("2024-09-03")));
        source.members.push(member(3, "M3"));
        allow(&mut source, 3, 1, &["A"]);

        let (_, results) = run(source, 2024, 9);

        assert!(results[0].success);
        assert_eq!(bound(&results[0]), vec![("A", 3)]);
    }

    #[test]
    fn test_monthly_cap_uses_persisted_rows() {
        let mut source = InMemorySource {
            performances: vec![performance(1, &["A"]), performance(2, &["X"])],
            members: vec![member(1, "Alice"), member(2, "Bob")],
            schedules: vec![
                schedule(1, 2, "2024-09-02 10:00"),
                schedule(2, 1, "2024-09-05 10:00"),
            ],
            ..Default::default()
        };
        source.members[0].max_monthly = 1;
        allow(&mut source, 1, 1, &["A"]);
        allow(&mut source, 2, 1, &["A"]);
        source.push_assignment(1, 1, "X", true);

        let (_, results) = run(source, 2024, 9);

        // 场次 1 只有手动角色, 仍计为成功
        assert!(results[0].success);
        assert!(results[0].assignments.is_empty());
        assert_eq!(bound(&results[1]), vec![("A", 2)]);
    }

    #[test]
    fn test_auto_assign_disabled_member_is_never_picked() {
        let mut source = two_role_source();
        source.members[0].auto_assign = false;

        let (_, results) = run(source, 2024, 9);
        assert_eq!(bound(&results[0]), vec![("A", 2)]);
    }

    // ==========================================
    // 手动分配与幂等
    // ==========================================

    #[test]
    fn test_manual_rows_are_preserved_and_skipped() {
        let source = two_role_source();
        source.push_assignment(1, 2, "A", true);

        let (source, results) = run(source, 2024, 9);

        assert!(results[0].success);
        assert_eq!(bound(&results[0]), vec![("B", 1)]);
        assert_eq!(
            source.rows_for(1),
            vec![("A".to_string(), 2, true), ("B".to_string(), 1, false)]
        );
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let source = Arc::new(same_day_source());
        let engine = AutoAssignEngine::new(source.clone());

        engine.run(2024, 9).unwrap();
        let first = (source.rows_for(1), source.rows_for(2));
        engine.run(2024, 9).unwrap();
        let second = (source.rows_for(1), source.rows_for(2));

        assert_eq!(first, second);
    }

    // ==========================================
    // 错误隔离
    // ==========================================

    #[test]
    fn test_missing_performance_fails_only_that_schedule() {
        let mut source = two_role_source();
        source.schedules.push(schedule(2, 99, "2024-09-04 10:00"));
        source.schedules.push(schedule(3, 1, "2024-09-05 10:00"));

        let (_, results) = run(source, 2024, 9);

        assert_eq!(results.len(), 3);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[1].performance.is_none());
        assert!(results[2].success);
    }

    #[test]
    fn test_save_failure_fails_only_that_schedule() {
        let mut source = two_role_source();
        source.schedules.push(schedule(2, 1, "2024-09-04 10:00"));
        source.fail_save_for = Some(1);

        let (source, results) = run(source, 2024, 9);

        assert!(!results[0].success);
        assert!(results[0].assignments.is_empty());
        assert!(results[1].success);
        // 失败场次不累加计数
        assert_eq!(bound(&results[1]), vec![("A", 1), ("B", 2)]);
        assert!(source.rows_for(1).is_empty());
    }

    // ==========================================
    // 前置条件
    // ==========================================

    #[test]
    fn test_invalid_month() {
        let engine = AutoAssignEngine::new(Arc::new(two_role_source()));
        assert!(matches!(
            engine.run(2024, 13),
            Err(AssignmentError::InvalidMonth { month: 13, .. })
        ));
    }

    #[test]
    fn test_no_schedules_in_month() {
        let engine = AutoAssignEngine::new(Arc::new(two_role_source()));
        assert!(matches!(
            engine.run(2024, 10),
            Err(AssignmentError::NoSchedulesInRange { year: 2024, month: 10 })
        ));
    }

    #[test]
    fn test_no_auto_assign_members() {
        let mut source = two_role_source();
        for m in &mut source.members {
            m.auto_assign = false;
        }
        let source = Arc::new(source);
        let engine = AutoAssignEngine::new(source.clone());

        assert!(matches!(
            engine.run(2024, 9),
            Err(AssignmentError::NoEligibleMembers)
        ));
        assert!(source.rows_for(1).is_empty());
    }
}
