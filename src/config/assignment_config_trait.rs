// ==========================================
// 剧团排班系统 - 分配配置读取 Trait
// ==========================================
// 职责: 定义自动分配所需的配置读取接口 (不包含实现)
// 红线: 不包含配置写入, 不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// AssignmentConfigReader Trait
// ==========================================
// 实现者: ConfigManager (从 config_kv 表读取)
#[async_trait]
pub trait AssignmentConfigReader: Send + Sync {
    /// 获取场馆时区偏移 (分钟)
    ///
    /// # 默认值
    /// - 540 (KST, UTC+9)
    async fn get_venue_utc_offset_minutes(&self) -> Result<i32, Box<dyn Error>>;

    /// 获取界面语言
    ///
    /// # 默认值
    /// - "en"
    async fn get_locale(&self) -> Result<String, Box<dyn Error>>;

    /// 获取新建团员的默认每月上限
    ///
    /// # 默认值
    /// - 10
    async fn get_default_max_monthly(&self) -> Result<u32, Box<dyn Error>>;
}
