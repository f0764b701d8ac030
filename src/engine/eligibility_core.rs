// ==========================================
// 剧团排班系统 - Eligibility Core 纯函数库
// ==========================================
// 职责: 月份范围、每月上限、回避星期/时段判定的纯逻辑
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::domain::member::Member;
use crate::domain::schedule::Schedule;
use crate::domain::types::{weekday_label, TimeRange};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// MonthRange - 目标月份
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRange {
    pub year: i32,
    pub month: u32,        // 1..=12
    pub first: NaiveDate,  // 当月第一天
    pub last: NaiveDate,   // 当月最后一天
}

impl MonthRange {
    /// 创建月份范围, month 不在 1..=12 时返回 None
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_first = if month == 12 {
            NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let last = next_first.pred_opt()?;
        Some(Self {
            year,
            month,
            first,
            last,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.first..=self.last).contains(&date)
    }

    /// 向前回溯 n 个月 (n = 0 返回自身)
    pub fn months_back(&self, n: u32) -> Option<Self> {
        let index = self.year.checked_mul(12)? + self.month as i32 - 1 - n as i32;
        MonthRange::new(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
    }
}

impl fmt::Display for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ==========================================
// Ineligibility - 不可分配原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    MonthlyCapReached { count: u32, max_monthly: u32 },
    AvoidedDay(Weekday),
    AvoidedTime(TimeRange),
    PersonalLeave(NaiveDate),
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligibility::MonthlyCapReached { count, max_monthly } => {
                write!(f, "MONTHLY_CAP_REACHED: {}/{}", count, max_monthly)
            }
            Ineligibility::AvoidedDay(day) => write!(f, "AVOIDED_DAY: {}", weekday_label(*day)),
            Ineligibility::AvoidedTime(range) => write!(f, "AVOIDED_TIME: {}", range),
            Ineligibility::PersonalLeave(date) => write!(f, "PERSONAL_LEAVE: {}", date),
        }
    }
}

// ==========================================
// EligibilityCore - 纯函数工具类
// ==========================================
pub struct EligibilityCore;

impl EligibilityCore {
    /// 每月上限检查: 已落库分配数必须严格小于上限
    pub fn check_monthly_cap(member: &Member, persisted_count: u32) -> Option<Ineligibility> {
        if persisted_count >= member.max_monthly {
            Some(Ineligibility::MonthlyCapReached {
                count: persisted_count,
                max_monthly: member.max_monthly,
            })
        } else {
            None
        }
    }

    /// 回避星期/时段检查
    ///
    /// # 规则
    /// - 集合时间的星期 ∈ avoid_days → 不可分配
    /// - 集合时间的时段 ∈ avoid_times → 不可分配
    /// - 12 点、17 点不属于任何时段, 回避时段对其不生效
    pub fn check_preferences(member: &Member, schedule: &Schedule) -> Option<Ineligibility> {
        let day = schedule.call_weekday();
        if member.avoids_day(day) {
            return Some(Ineligibility::AvoidedDay(day));
        }

        match schedule.call_time_range() {
            Some(range) if member.avoids_time(range) => Some(Ineligibility::AvoidedTime(range)),
            _ => None,
        }
    }

    /// 团员可出演角色是否包含目标角色
    pub fn role_allowed(available_roles: Option<&[String]>, role: &str) -> bool {
        available_roles
            .map(|roles| roles.iter().any(|r| r == role))
            .unwrap_or(false)
    }

    /// 当日班底分组键: (场馆本地日期, 剧目)
    pub fn team_key(schedule: &Schedule) -> (NaiveDate, i64) {
        (schedule.call_date(), schedule.performance_id)
    }
}
