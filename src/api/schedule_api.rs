// ==========================================
// 剧团排班系统 - 场次 API
// ==========================================
// 职责: 场次状态变更、按月/状态查询场次、场馆演出统计
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::assignment_api::source_with_venue_clock;
use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::schedule::{Schedule, ScheduleStatus, VenueStats};
use crate::engine::{MonthRange, RepositoryDataSource};

/// 场馆统计报表 (汇总 + 各场馆明细)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueStatsReport {
    pub total_count: u32,
    pub completed_count: u32,
    pub cancelled_count: u32,
    pub venues: Vec<VenueStats>,
}

pub struct ScheduleApi {
    data_source: RepositoryDataSource,
    config_manager: Arc<ConfigManager>,
}

impl ScheduleApi {
    pub fn new(data_source: RepositoryDataSource, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            data_source,
            config_manager,
        }
    }

    /// 变更场次状态
    pub fn update_schedule_status(&self, schedule_id: i64, status: ScheduleStatus) -> ApiResult<()> {
        self.data_source
            .schedule_repo
            .update_status(schedule_id, status)?;
        info!(schedule_id, status = %status, "场次状态已更新");
        Ok(())
    }

    /// 查询目标月份的场次 (按集合时间升序), status 为 None 时不过滤
    pub fn list_month_schedules(
        &self,
        year: i32,
        month: u32,
        status: Option<ScheduleStatus>,
    ) -> ApiResult<Vec<Schedule>> {
        let range = MonthRange::new(year, month)
            .ok_or_else(|| ApiError::InvalidInput(format!("无效的月份: {}-{}", year, month)))?;

        let source = source_with_venue_clock(&self.data_source, &self.config_manager)?;
        let mut schedules =
            source
                .schedule_repo
                .list_by_call_date_range(source.clock(), range.first, range.last)?;
        if let Some(status) = status {
            schedules.retain(|s| s.status == status);
        }
        Ok(schedules)
    }

    /// 场馆演出统计
    ///
    /// # 参数
    /// - start/end: 开演日期范围 (含), 可省略任一端
    pub fn venue_stats(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ApiResult<VenueStatsReport> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ApiError::InvalidInput(format!(
                    "开始日期{}晚于结束日期{}",
                    start, end
                )));
            }
        }

        let source = source_with_venue_clock(&self.data_source, &self.config_manager)?;
        let venues = source.schedule_repo.venue_stats(source.clock(), start, end)?;

        Ok(VenueStatsReport {
            total_count: venues.iter().map(|v| v.total_count).sum(),
            completed_count: venues.iter().map(|v| v.completed_count).sum(),
            cancelled_count: venues.iter().map(|v| v.cancelled_count).sum(),
            venues,
        })
    }
}
