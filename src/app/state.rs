// ==========================================
// 剧团排班系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{AssignmentApi, ScheduleApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::RepositoryDataSource;
use crate::repository::{
    AssignmentRepository, MemberRepository, PerformanceRepository, PersonalLeaveRepository,
    ScheduleRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源, 所有仓储共用一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 角色分配API
    pub assignment_api: Arc<AssignmentApi>,

    /// 场次API
    pub schedule_api: Arc<ScheduleApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 仓储集合 (种子数据/维护工具使用)
    pub repositories: RepositoryDataSource,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并建表 (幂等)
    /// 2. 初始化所有Repository
    /// 3. 创建API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let performance_repo = Arc::new(PerformanceRepository::from_connection(conn.clone()));
        let member_repo = Arc::new(MemberRepository::from_connection(conn.clone()));
        let schedule_repo = Arc::new(ScheduleRepository::from_connection(conn.clone()));
        let assignment_repo = Arc::new(AssignmentRepository::from_connection(conn.clone()));
        let leave_repo = Arc::new(PersonalLeaveRepository::from_connection(conn.clone()));

        // ==========================================
        // 配置与场馆时区
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let clock = config_manager
            .venue_clock()
            .map_err(|e| format!("读取场馆时区失败: {}", e))?;

        let repositories = RepositoryDataSource::new(
            performance_repo,
            member_repo,
            schedule_repo,
            assignment_repo,
            leave_repo,
            clock,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let assignment_api = Arc::new(AssignmentApi::new(
            repositories.clone(),
            config_manager.clone(),
        ));
        let schedule_api = Arc::new(ScheduleApi::new(
            repositories.clone(),
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            assignment_api,
            schedule_api,
            config_manager,
            repositories,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 PLAYSEE_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("PLAYSEE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./playsee.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("playsee");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("playsee.db");
        }
    }

    path.to_string_lossy().to_string()
}
