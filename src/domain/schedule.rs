// ==========================================
// 剧团排班系统 - 场次领域模型
// ==========================================
// 对齐: schedules 表
// 说明: 同一剧目同一天可有多个场次 (不同场馆/时间), 即"同日场次"
// ==========================================

use crate::domain::types::TimeRange;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ScheduleStatus - 场次状态
// ==========================================
// pending → completed / cancelled, 可人工改回
// 自动分配不区分状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(ScheduleStatus::Pending),
            "completed" => Some(ScheduleStatus::Completed),
            "cancelled" => Some(ScheduleStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// Schedule - 演出场次
// ==========================================
// 时间均为场馆本地时间 (见 VenueClock)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub performance_id: i64,
    pub call_time: NaiveDateTime,  // 集合时间
    pub start_time: NaiveDateTime, // 开演时间
    pub venue: String,
    pub status: ScheduleStatus,
}

impl Schedule {
    /// 场次日历日期 (由集合时间推导)
    pub fn call_date(&self) -> NaiveDate {
        self.call_time.date()
    }

    pub fn call_weekday(&self) -> Weekday {
        self.call_time.weekday()
    }

    /// 集合时间所属时段 (12 点/17 点返回 None)
    pub fn call_time_range(&self) -> Option<TimeRange> {
        TimeRange::from_hour(self.call_time.hour())
    }
}

/// 新建/更新场次参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSchedule {
    pub performance_id: i64,
    pub call_time: NaiveDateTime,
    pub start_time: NaiveDateTime,
    pub venue: String,
}

// ==========================================
// VenueStats - 场馆演出统计
// ==========================================
// 按开演时间的场馆本地日期统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueStats {
    pub venue: String,
    pub total_count: u32,
    pub completed_count: u32,
    pub cancelled_count: u32,
    pub latest_start: NaiveDateTime,    // 最近一场的开演时间
    pub performance_names: Vec<String>, // 去重, 按名称排序
}
