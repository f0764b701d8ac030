// ==========================================
// 剧团排班系统 - 角色分配领域模型
// ==========================================
// 对齐: assignments 表
// 红线: 每个 (schedule_id, role) 至多一条记录
// 红线: 自动分配不得覆盖手动分配 (is_manual = true)
// ==========================================

use crate::domain::performance::Performance;
use crate::domain::schedule::Schedule;
use serde::{Deserialize, Serialize};

// ==========================================
// Assignment - 分配记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub schedule_id: i64,
    pub member_id: i64,
    pub role: String,
    pub is_manual: bool,
}

// ==========================================
// RoleBinding - 单个角色绑定 (引擎输出)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub member_id: i64,
    pub member_name: String,
    pub role: String,
}

// ==========================================
// ScheduleResult - 单场次分配结果
// ==========================================
// success = true: assignments 为本次自动分配的绑定
// success = false: error 给出原因, performance 可能缺失
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub success: bool,
    pub schedule: Schedule,
    pub performance: Option<Performance>,
    pub assignments: Vec<RoleBinding>,
    pub error: Option<String>,
}

impl ScheduleResult {
    pub fn succeeded(
        schedule: Schedule,
        performance: Performance,
        assignments: Vec<RoleBinding>,
    ) -> Self {
        Self {
            success: true,
            schedule,
            performance: Some(performance),
            assignments,
            error: None,
        }
    }

    pub fn failed(schedule: Schedule, performance: Option<Performance>, error: String) -> Self {
        Self {
            success: false,
            schedule,
            performance,
            assignments: Vec::new(),
            error: Some(error),
        }
    }
}

// ==========================================
// 查询视图
// ==========================================

/// 场次分配明细 (带团员姓名)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentView {
    pub assignment_id: i64,
    pub member_id: i64,
    pub member_name: String,
    pub role: String,
    pub is_manual: bool,
}

/// 手动分配输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualAssignmentInput {
    pub member_id: i64,
    pub role: String,
}
