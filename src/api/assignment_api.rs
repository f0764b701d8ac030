// ==========================================
// 剧团排班系统 - 角色分配 API
// ==========================================
// 职责: 自动分配运行、手动分配保存、分配查询、近几个月出演统计
// 红线: 同一时间只允许一次自动分配运行 (后到者立即失败, 不排队)
// ==========================================

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::assignment::{AssignmentView, ManualAssignmentInput, ScheduleResult};
use crate::engine::{AutoAssignEngine, MonthRange, RepositoryDataSource};

// ==========================================
// 响应结构
// ==========================================

/// 自动分配运行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoAssignResponse {
    /// 运行ID (日志追溯用)
    pub run_id: String,
    pub year: i32,
    pub month: u32,
    /// 处理的场次总数
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    /// 按处理顺序的场次结果
    pub results: Vec<ScheduleResult>,
}

/// 单月出演次数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub count: u32,
}

/// 按最新场馆时区配置构造数据源
pub(crate) fn source_with_venue_clock(
    data_source: &RepositoryDataSource,
    config_manager: &ConfigManager,
) -> ApiResult<RepositoryDataSource> {
    let clock = config_manager
        .venue_clock()
        .map_err(|e| ApiError::InternalError(format!("读取场馆时区失败: {}", e)))?;
    Ok(data_source.clone().with_clock(clock))
}

// ==========================================
// AssignmentApi - 角色分配 API
// ==========================================

/// 角色分配API
///
/// 职责：
/// 1. 自动分配 (单次运行保护)
/// 2. 手动分配 (整体替换场次分配)
/// 3. 场次分配查询
/// 4. 团员近几个月出演次数
pub struct AssignmentApi {
    data_source: RepositoryDataSource,
    config_manager: Arc<ConfigManager>,
    run_guard: AsyncMutex<()>,
}

impl AssignmentApi {
    /// 创建新的AssignmentApi实例
    pub fn new(data_source: RepositoryDataSource, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            data_source,
            config_manager,
            run_guard: AsyncMutex::new(()),
        }
    }

    fn current_source(&self) -> ApiResult<RepositoryDataSource> {
        source_with_venue_clock(&self.data_source, &self.config_manager)
    }

    /// 执行目标月份的自动分配
    ///
    /// # 参数
    /// - year: 年
    /// - month: 月 (1..=12)
    ///
    /// # 返回
    /// - Ok(AutoAssignResponse): 运行汇总与场次结果
    /// - Err(ApiError::AssignmentInProgress): 已有运行在进行
    /// - Err(ApiError::NoSchedulesInRange / NoEligibleMembers / InvalidInput): 前置条件不满足
    pub async fn run_auto_assignment(&self, year: i32, month: u32) -> ApiResult<AutoAssignResponse> {
        let _guard = self.run_guard.try_lock().map_err(|_| {
            warn!(year, month, "自动分配正在进行中，拒绝重复运行");
            ApiError::AssignmentInProgress
        })?;

        let run_id = Uuid::new_v4().to_string();
        let source = self.current_source()?;

        info!(
            run_id = %run_id,
            year,
            month,
            utc_offset_seconds = source.clock().offset().local_minus_utc(),
            "自动分配开始"
        );

        let source = Arc::new(source);
        let results = tokio::task::spawn_blocking(move || AutoAssignEngine::new(source).run(year, month))
            .await
            .map_err(|e| ApiError::InternalError(format!("自动分配任务异常: {}", e)))??;

        let total = results.len();
        let success_count = results.iter().filter(|r| r.success).count();
        let failure_count = total - success_count;

        info!(
            run_id = %run_id,
            total,
            success_count,
            failure_count,
            "自动分配结束"
        );

        Ok(AutoAssignResponse {
            run_id,
            year,
            month,
            total,
            success_count,
            failure_count,
            results,
        })
    }

    /// 保存手动分配 (整体替换场次的全部分配)
    ///
    /// # 校验
    /// - 场次存在
    /// - 角色属于该场次剧目, 且不重复
    /// - 团员存在, 且不重复
    pub fn save_manual_assignments(
        &self,
        schedule_id: i64,
        inputs: &[ManualAssignmentInput],
    ) -> ApiResult<()> {
        let source = self.current_source()?;
        let schedule = source
            .schedule_repo
            .find_by_id(source.clock(), schedule_id)?
            .ok_or_else(|| ApiError::NotFound(format!("场次(id={})不存在", schedule_id)))?;

        let performance = source
            .performance_repo
            .find_by_id(schedule.performance_id)?
            .ok_or_else(|| {
                ApiError::NotFound(format!("剧目(id={})不存在", schedule.performance_id))
            })?;

        let mut roles = HashSet::new();
        let mut members = HashSet::new();
        for input in inputs {
            if !performance.has_role(&input.role) {
                return Err(ApiError::InvalidInput(format!(
                    "角色{}不属于剧目{}",
                    input.role, performance.name
                )));
            }
            if !roles.insert(input.role.as_str()) {
                return Err(ApiError::InvalidInput(format!("角色{}重复分配", input.role)));
            }
            if !members.insert(input.member_id) {
                return Err(ApiError::InvalidInput(format!(
                    "团员(id={})在同一场次重复分配",
                    input.member_id
                )));
            }
            if source.member_repo.find_by_id(input.member_id)?.is_none() {
                return Err(ApiError::NotFound(format!(
                    "团员(id={})不存在",
                    input.member_id
                )));
            }
        }

        source
            .assignment_repo
            .replace_with_manual(schedule_id, inputs)?;

        info!(schedule_id, count = inputs.len(), "手动分配已保存");
        Ok(())
    }

    /// 查询场次分配 (按剧目角色顺序)
    pub fn list_schedule_assignments(&self, schedule_id: i64) -> ApiResult<Vec<AssignmentView>> {
        let source = self.current_source()?;
        let schedule = source
            .schedule_repo
            .find_by_id(source.clock(), schedule_id)?
            .ok_or_else(|| ApiError::NotFound(format!("场次(id={})不存在", schedule_id)))?;

        let mut views = source.assignment_repo.list_views_by_schedule(schedule_id)?;
        if let Some(performance) = source.performance_repo.find_by_id(schedule.performance_id)? {
            // 不在角色表中的角色排在最后
            views.sort_by_key(|v| performance.role_position(&v.role).unwrap_or(usize::MAX));
        }
        Ok(views)
    }

    /// 团员近几个月的出演次数 (自动 + 手动, 从早到晚)
    ///
    /// # 参数
    /// - year/month: 截止月份 (含)
    /// - months: 月数 (>= 1)
    pub fn recent_monthly_counts(
        &self,
        member_id: i64,
        year: i32,
        month: u32,
        months: u32,
    ) -> ApiResult<Vec<MonthlyCount>> {
        if months == 0 {
            return Err(ApiError::InvalidInput("月数必须大于0".to_string()));
        }
        let anchor = MonthRange::new(year, month)
            .ok_or_else(|| ApiError::InvalidInput(format!("无效的月份: {}-{}", year, month)))?;

        let source = self.current_source()?;
        if source.member_repo.find_by_id(member_id)?.is_none() {
            return Err(ApiError::NotFound(format!("团员(id={})不存在", member_id)));
        }

        let mut counts = Vec::with_capacity(months as usize);
        for back in (0..months).rev() {
            let range = anchor
                .months_back(back)
                .ok_or_else(|| ApiError::InvalidInput(format!("月份超出范围: {}", anchor)))?;
            let count = source.assignment_repo.count_for_member_between(
                source.clock(),
                member_id,
                range.first,
                range.last,
            )?;
            counts.push(MonthlyCount {
                year: range.year,
                month: range.month,
                count,
            });
        }
        Ok(counts)
    }
}
