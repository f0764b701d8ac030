// ==========================================
// 剧团排班系统 - 剧目数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::performance::{NewPerformance, Performance};
use crate::repository::columns::{decode_string_list, encode_string_list};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

type PerformanceRow = (i64, String, Option<String>, Option<String>);

// ==========================================
// PerformanceRepository - 剧目仓储
// ==========================================
/// 职责: 管理 performances 表的 CRUD 操作
pub struct PerformanceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PerformanceRepository {
    /// 创建新的 PerformanceRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建剧目, 返回新 id
    pub fn create(&self, performance: &NewPerformance) -> RepositoryResult<i64> {
        let roles = encode_string_list(&performance.roles)?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO performances (name, roles, notes) VALUES (?1, ?2, ?3)",
            params![performance.name, roles, performance.notes],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按 id 查询
    ///
    /// # 返回
    /// - Ok(Some(Performance)): 找到剧目
    /// - Ok(None): 未找到
    /// - Err: 数据库错误或角色列表格式错误
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Performance>> {
        let row: Option<PerformanceRow> = {
            let conn = self.get_conn()?;
            conn.query_row(
                "SELECT id, name, roles, notes FROM performances WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?
        };

        row.map(map_performance).transpose()
    }

    /// 查询全部剧目 (按名称排序)
    pub fn list_all(&self) -> RepositoryResult<Vec<Performance>> {
        let rows: Vec<PerformanceRow> = {
            let conn = self.get_conn()?;
            let mut stmt =
                conn.prepare("SELECT id, name, roles, notes FROM performances ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        rows.into_iter().map(map_performance).collect()
    }

    /// 更新剧目
    pub fn update(&self, id: i64, performance: &NewPerformance) -> RepositoryResult<()> {
        let roles = encode_string_list(&performance.roles)?;
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE performances SET name = ?1, roles = ?2, notes = ?3 WHERE id = ?4",
            params![performance.name, roles, performance.notes, id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Performance".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除剧目 (级联删除场次与可出演角色)
    pub fn delete(&self, id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(conn.execute("DELETE FROM performances WHERE id = ?1", params![id])?)
    }
}

fn map_performance(row: PerformanceRow) -> RepositoryResult<Performance> {
    let (id, name, roles, notes) = row;
    Ok(Performance {
        id,
        name,
        roles: decode_string_list("performances.roles", roles)?,
        notes,
    })
}
