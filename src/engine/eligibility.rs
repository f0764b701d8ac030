// ==========================================
// 剧团排班系统 - 分配资格引擎
// ==========================================
// 职责: 判定团员能否分配到指定场次 (can_assign)
// 规则: 每月上限 + 回避星期 + 回避时段 + 个人请假, 全部满足才可分配
// 红线: 每月上限使用已落库计数, 与本次运行的公平计数器无关
// ==========================================

use crate::domain::member::Member;
use crate::domain::schedule::Schedule;
use crate::engine::data_source::AssignmentDataSource;
use crate::engine::eligibility_core::{EligibilityCore, Ineligibility, MonthRange};
use crate::repository::error::RepositoryResult;
use std::sync::Arc;
use tracing::trace;

// ==========================================
// EligibilityEngine - 分配资格引擎
// ==========================================
// 红线: 不直接写库, 只读取计数与请假
pub struct EligibilityEngine<S>
where
    S: AssignmentDataSource,
{
    source: Arc<S>,
}

impl<S> EligibilityEngine<S>
where
    S: AssignmentDataSource,
{
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// 评估团员对场次的分配资格
    ///
    /// # 返回
    /// - Ok(None): 可分配
    /// - Ok(Some(reason)): 不可分配及原因
    /// - Err: 数据访问失败
    pub fn evaluate(
        &self,
        member: &Member,
        schedule: &Schedule,
        month: &MonthRange,
    ) -> RepositoryResult<Option<Ineligibility>> {
        // 纯规则优先, 避免无谓的查询
        if let Some(reason) = EligibilityCore::check_preferences(member, schedule) {
            return Ok(Some(reason));
        }

        let persisted = self
            .source
            .count_member_assignments(member.id, month.first, month.last)?;
        if let Some(reason) = EligibilityCore::check_monthly_cap(member, persisted) {
            return Ok(Some(reason));
        }

        let date = schedule.call_date();
        if self.source.has_personal_leave(member.id, date)? {
            return Ok(Some(Ineligibility::PersonalLeave(date)));
        }

        Ok(None)
    }

    /// 团员能否分配到场次
    pub fn can_assign(
        &self,
        member: &Member,
        schedule: &Schedule,
        month: &MonthRange,
    ) -> RepositoryResult<bool> {
        match self.evaluate(member, schedule, month)? {
            Some(reason) => {
                trace!(
                    member_id = member.id,
                    schedule_id = schedule.id,
                    reason = %reason,
                    "团员不可分配"
                );
                Ok(false)
            }
            None => Ok(true),
        }
    }
}
