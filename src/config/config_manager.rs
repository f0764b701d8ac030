// ==========================================
// 剧团排班系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::assignment_config_trait::AssignmentConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::member::DEFAULT_MAX_MONTHLY;
use crate::domain::types::{VenueClock, DEFAULT_VENUE_UTC_OFFSET_MINUTES};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 默认界面语言
pub const DEFAULT_LOCALE: &str = "en";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 会对传入连接再次应用统一 PRAGMA (幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值 (scope_id='global')
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值 (存在则覆盖)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置的快照 (JSON)
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    fn venue_offset_minutes(&self) -> Result<i32, Box<dyn Error>> {
        let default = DEFAULT_VENUE_UTC_OFFSET_MINUTES.to_string();
        let value = self.get_config_or_default(config_keys::VENUE_UTC_OFFSET_MINUTES, &default)?;
        Ok(value
            .trim()
            .parse::<i32>()
            .unwrap_or(DEFAULT_VENUE_UTC_OFFSET_MINUTES))
    }

    /// 按配置构造场馆时钟
    ///
    /// 偏移超出 ±24h 时回退到默认时区并记录警告
    pub fn venue_clock(&self) -> Result<VenueClock, Box<dyn Error>> {
        let minutes = self.venue_offset_minutes()?;
        Ok(VenueClock::from_offset_minutes(minutes).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::VENUE_UTC_OFFSET_MINUTES,
                minutes,
                "场馆时区偏移非法，使用默认时区"
            );
            VenueClock::default()
        }))
    }
}

// ==========================================
// AssignmentConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AssignmentConfigReader for ConfigManager {
    async fn get_venue_utc_offset_minutes(&self) -> Result<i32, Box<dyn Error>> {
        self.venue_offset_minutes()
    }

    async fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::LOCALE, DEFAULT_LOCALE)?;
        let value = value.trim();
        if value.is_empty() {
            Ok(DEFAULT_LOCALE.to_string())
        } else {
            Ok(value.to_string())
        }
    }

    async fn get_default_max_monthly(&self) -> Result<u32, Box<dyn Error>> {
        let default = DEFAULT_MAX_MONTHLY.to_string();
        let value = self.get_config_or_default(config_keys::DEFAULT_MAX_MONTHLY, &default)?;
        Ok(value.trim().parse::<u32>().unwrap_or(DEFAULT_MAX_MONTHLY))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 场馆时区 (UTC 偏移分钟数)
    pub const VENUE_UTC_OFFSET_MINUTES: &str = "venue_utc_offset_minutes";

    // 界面语言
    pub const LOCALE: &str = "locale";

    // 新建团员默认每月上限
    pub const DEFAULT_MAX_MONTHLY: &str = "default_max_monthly";
}
