// ==========================================
// 剧团排班系统 - 团员领域模型
// ==========================================
// 对齐: members / member_performances / personal_schedules 表
// ==========================================

use crate::domain::types::TimeRange;
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// 默认每月出演上限
pub const DEFAULT_MAX_MONTHLY: u32 = 10;

// ==========================================
// Member - 团员
// ==========================================
// 红线: auto_assign = false 的团员不进入自动分配候选池
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,                // 姓名 (唯一)
    pub auto_assign: bool,           // 是否参与自动分配
    pub max_monthly: u32,            // 每月分配上限 (自动 + 手动)
    pub avoid_times: Vec<TimeRange>, // 回避时段
    pub avoid_days: Vec<Weekday>,    // 回避星期
    pub memo: Option<String>,
}

impl Member {
    pub fn avoids_time(&self, range: TimeRange) -> bool {
        self.avoid_times.contains(&range)
    }

    pub fn avoids_day(&self, day: Weekday) -> bool {
        self.avoid_days.contains(&day)
    }
}

/// 新建/更新团员参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub auto_assign: bool,
    pub max_monthly: u32,
    pub avoid_times: Vec<TimeRange>,
    pub avoid_days: Vec<Weekday>,
    pub memo: Option<String>,
}

impl NewMember {
    /// 以默认设置创建 (参与自动分配, 无回避)
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            auto_assign: true,
            max_monthly: DEFAULT_MAX_MONTHLY,
            avoid_times: Vec::new(),
            avoid_days: Vec::new(),
            memo: None,
        }
    }
}

// ==========================================
// MemberPerformance - 团员可出演角色
// ==========================================
// 无记录 = 该团员不能出演该剧目的任何角色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPerformance {
    pub member_id: i64,
    pub performance_id: i64,
    pub available_roles: Vec<String>,
}

// ==========================================
// PersonalLeave - 个人请假
// ==========================================
// 请假日当天不可分配到任何场次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalLeave {
    pub id: i64,
    pub member_id: i64,
    pub date: NaiveDate,
    pub reason: Option<String>,
}
