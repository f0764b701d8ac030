// ==========================================
// 剧团排班系统 - 领域类型定义
// ==========================================
// 职责: 时间段、星期标签、场馆时区等值类型
// 红线: 时段边界不得擅自修改 (12 点与 17 点不属于任何时段)
// ==========================================

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 时间段 (Time Range)
// ==========================================
// 边界: [9,12) 上午, [13,17) 下午, [18,21) 傍晚, [21,24)∪[0,9) 夜间
// 注意: 12 点与 17 点不属于任何时段, 因此不受回避时段约束
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    Morning,   // 上午
    Afternoon, // 下午
    Evening,   // 傍晚
    Night,     // 夜间
}

impl TimeRange {
    /// 按小时映射时段
    ///
    /// # 返回
    /// - Some(TimeRange): 命中的时段
    /// - None: 12 点或 17 点 (不属于任何时段)
    pub fn from_hour(hour: u32) -> Option<Self> {
        match hour {
            9..=11 => Some(TimeRange::Morning),
            13..=16 => Some(TimeRange::Afternoon),
            18..=20 => Some(TimeRange::Evening),
            21..=23 | 0..=8 => Some(TimeRange::Night),
            _ => None,
        }
    }

    /// 数据库存储标签
    pub fn as_label(&self) -> &'static str {
        match self {
            TimeRange::Morning => "morning",
            TimeRange::Afternoon => "afternoon",
            TimeRange::Evening => "evening",
            TimeRange::Night => "night",
        }
    }

    /// 解析时段标签
    ///
    /// 兼容英文标签与旧版界面写入的韩文标签 (如 `오전(09-12시)`)
    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "morning" => return Some(TimeRange::Morning),
            "afternoon" => return Some(TimeRange::Afternoon),
            "evening" => return Some(TimeRange::Evening),
            "night" => return Some(TimeRange::Night),
            _ => {}
        }

        if trimmed.starts_with("오전") {
            Some(TimeRange::Morning)
        } else if trimmed.starts_with("오후") {
            Some(TimeRange::Afternoon)
        } else if trimmed.starts_with("저녁") {
            Some(TimeRange::Evening)
        } else if trimmed.starts_with("야간") {
            Some(TimeRange::Night)
        } else {
            None
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

// ==========================================
// 星期标签
// ==========================================

/// 星期的数据库存储标签 (英文全称)
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// 解析星期标签
///
/// 兼容: 英文全称/缩写 (大小写不敏感), 旧版韩文标签 (`월요일` 等)
pub fn parse_weekday_label(label: &str) -> Option<Weekday> {
    let trimmed = label.trim();
    if let Ok(day) = trimmed.parse::<Weekday>() {
        return Some(day);
    }

    match trimmed {
        "월요일" | "월" => Some(Weekday::Mon),
        "화요일" | "화" => Some(Weekday::Tue),
        "수요일" | "수" => Some(Weekday::Wed),
        "목요일" | "목" => Some(Weekday::Thu),
        "금요일" | "금" => Some(Weekday::Fri),
        "토요일" | "토" => Some(Weekday::Sat),
        "일요일" | "일" => Some(Weekday::Sun),
        _ => None,
    }
}

// ==========================================
// VenueClock - 场馆时区
// ==========================================
// 所有日历日期/小时推导统一使用场馆时区, 不依赖宿主机 locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VenueClock {
    offset: FixedOffset,
}

/// 默认场馆时区偏移 (分钟), KST = UTC+9
pub const DEFAULT_VENUE_UTC_OFFSET_MINUTES: i32 = 540;

const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// 时间戳写库格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl VenueClock {
    /// 由 UTC 偏移分钟数创建, 偏移非法时返回 None
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// 解析时间戳为场馆本地时间
    ///
    /// - 无时区的时间戳视为场馆本地时间
    /// - 带偏移的 RFC 3339 时间戳换算到场馆时区
    pub fn parse_local(&self, raw: &str) -> Option<NaiveDateTime> {
        let trimmed = raw.trim();

        for format in NAIVE_TIMESTAMP_FORMATS {
            if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(ts);
            }
        }

        DateTime::parse_from_rfc3339(trimmed)
            .ok()
            .map(|ts| ts.with_timezone(&self.offset).naive_local())
    }
}

impl Default for VenueClock {
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(DEFAULT_VENUE_UTC_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
        }
    }
}
