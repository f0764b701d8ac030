// ==========================================
// 剧团排班系统 - JSON/时间列编解码
// ==========================================
// 说明: 角色列表、回避设置等以 JSON 数组文本存储
// ==========================================

use crate::domain::types::VenueClock;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};

/// 解析 JSON 字符串数组列 (NULL / 空串 视为空列表)
pub(crate) fn decode_string_list(field: &str, raw: Option<String>) -> RepositoryResult<Vec<String>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => serde_json::from_str::<Vec<String>>(text).map_err(|e| {
            RepositoryError::FieldValueError {
                field: field.to_string(),
                message: format!("无效的 JSON 数组 '{}': {}", text, e),
            }
        }),
    }
}

pub(crate) fn encode_string_list<S: AsRef<str>>(items: &[S]) -> RepositoryResult<String> {
    let items: Vec<&str> = items.iter().map(|s| s.as_ref()).collect();
    Ok(serde_json::to_string(&items)?)
}

/// 解析时间戳列为场馆本地时间
pub(crate) fn decode_timestamp(
    clock: &VenueClock,
    field: &str,
    raw: &str,
) -> RepositoryResult<NaiveDateTime> {
    clock
        .parse_local(raw)
        .ok_or_else(|| RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("无法解析时间戳: {}", raw),
        })
}

pub(crate) fn decode_date(field: &str, raw: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("无法解析日期 '{}': {}", raw, e),
        }
    })
}
