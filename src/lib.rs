// ==========================================
// 剧团排班系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 剧团演出场次的角色自动分配 (人工可覆盖)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 自动分配规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{TimeRange, VenueClock};

// 领域实体
pub use domain::{
    Assignment, AssignmentView, ManualAssignmentInput, Member, MemberPerformance, NewMember,
    NewPerformance, NewSchedule, Performance, PersonalLeave, RoleBinding, Schedule,
    ScheduleResult, ScheduleStatus, VenueStats,
};

// 引擎
pub use engine::{AssignmentDataSource, AutoAssignEngine, EligibilityCore, RepositoryDataSource};

// API
pub use api::{AssignmentApi, AutoAssignResponse, ScheduleApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "playsee";
