// ==========================================
// 剧团排班系统 - 引擎层错误类型
// ==========================================
// 前置条件错误在任何写库之前抛出, 整次运行中止
// 其他错误按场次隔离, 转为失败结果 (不在此枚举中传播)
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("无效的月份: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },

    #[error("目标月份没有场次: {year}-{month:02}")]
    NoSchedulesInRange { year: i32, month: u32 },

    #[error("没有参与自动分配的团员")]
    NoEligibleMembers,

    #[error("数据访问失败: {0}")]
    DataAccess(#[from] RepositoryError),
}

pub type AssignmentResult<T> = Result<T, AssignmentError>;
