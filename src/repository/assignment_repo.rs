// ==========================================
// 剧团排班系统 - 角色分配数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 自动分配只删除/写入 is_manual = 0 的记录
// ==========================================

use crate::domain::assignment::{Assignment, AssignmentView, ManualAssignmentInput, RoleBinding};
use crate::domain::types::VenueClock;
use crate::repository::columns::decode_timestamp;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schedule_repo::widened_bounds;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// AssignmentRepository - 分配仓储
// ==========================================
pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询场次的全部分配
    pub fn list_by_schedule(&self, schedule_id: i64) -> RepositoryResult<Vec<Assignment>> {
        self.query_by_schedule(schedule_id, false)
    }

    /// 查询场次的手动分配
    pub fn list_manual_by_schedule(&self, schedule_id: i64) -> RepositoryResult<Vec<Assignment>> {
        self.query_by_schedule(schedule_id, true)
    }

    fn query_by_schedule(
        &self,
        schedule_id: i64,
        manual_only: bool,
    ) -> RepositoryResult<Vec<Assignment>> {
        let conn = self.get_conn()?;
        let sql = if manual_only {
            r#"
            SELECT id, schedule_id, member_id, role, is_manual FROM assignments
            WHERE schedule_id = ?1 AND is_manual = 1
            ORDER BY id
            "#
        } else {
            r#"
            SELECT id, schedule_id, member_id, role, is_manual FROM assignments
            WHERE schedule_id = ?1
            ORDER BY id
            "#
        };
        let mut stmt = conn.prepare(sql)?;
        let assignments = stmt
            .query_map(params![schedule_id], |row| {
                Ok(Assignment {
                    id: row.get(0)?,
                    schedule_id: row.get(1)?,
                    member_id: row.get(2)?,
                    role: row.get(3)?,
                    is_manual: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(assignments)
    }

    /// 查询场次分配明细 (带团员姓名)
    pub fn list_views_by_schedule(&self, schedule_id: i64) -> RepositoryResult<Vec<AssignmentView>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.id, a.member_id, m.name, a.role, a.is_manual
            FROM assignments a
            JOIN members m ON a.member_id = m.id
            WHERE a.schedule_id = ?1
            ORDER BY a.id
            "#,
        )?;
        let views = stmt
            .query_map(params![schedule_id], |row| {
                Ok(AssignmentView {
                    assignment_id: row.get(0)?,
                    member_id: row.get(1)?,
                    member_name: row.get(2)?,
                    role: row.get(3)?,
                    is_manual: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(views)
    }

    /// 删除场次的自动分配 (手动分配保留)
    pub fn delete_auto_by_schedule(&self, schedule_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(conn.execute(
            "DELETE FROM assignments WHERE schedule_id = ?1 AND is_manual = 0",
            params![schedule_id],
        )?)
    }

    /// 批量写入自动分配 (单事务: 全部成功或全部回滚)
    pub fn insert_auto_batch(
        &self,
        schedule_id: i64,
        bindings: &[RoleBinding],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO assignments (schedule_id, member_id, role, is_manual)
                VALUES (?1, ?2, ?3, 0)
                "#,
            )?;
            for binding in bindings {
                stmt.execute(params![schedule_id, binding.member_id, binding.role])?;
            }
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 以手动分配整体替换场次的全部分配 (单事务)
    pub fn replace_with_manual(
        &self,
        schedule_id: i64,
        inputs: &[ManualAssignmentInput],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        tx.execute(
            "DELETE FROM assignments WHERE schedule_id = ?1",
            params![schedule_id],
        )?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO assignments (schedule_id, member_id, role, is_manual)
                VALUES (?1, ?2, ?3, 1)
                "#,
            )?;
            for input in inputs {
                stmt.execute(params![schedule_id, input.member_id, input.role])?;
            }
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 统计团员在 [start, end] (场馆本地日期, 含) 内的分配数 (自动 + 手动)
    pub fn count_for_member_between(
        &self,
        clock: &VenueClock,
        member_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<u32> {
        let (lower, upper) = widened_bounds(start, end);
        let call_times: Vec<(i64, String)> = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(
                r#"
                SELECT s.id, s.call_time FROM assignments a
                JOIN schedules s ON a.schedule_id = s.id
                WHERE a.member_id = ?1
                  AND substr(s.call_time, 1, 10) BETWEEN ?2 AND ?3
                "#,
            )?;
            let rows = stmt
                .query_map(params![member_id, lower, upper], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut count = 0u32;
        for (schedule_id, raw) in call_times {
            match decode_timestamp(clock, "schedules.call_time", &raw) {
                Ok(local) if (start..=end).contains(&local.date()) => count += 1,
                Ok(_) => {}
                Err(e) => {
                    warn!(schedule_id, member_id, error = %e, "统计时跳过时间戳无效的场次");
                }
            }
        }
        Ok(count)
    }
}
