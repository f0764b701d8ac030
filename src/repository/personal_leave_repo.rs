// ==========================================
// 剧团排班系统 - 个人请假数据仓储
// ==========================================
// 表: personal_schedules (member_id, date 唯一)
// ==========================================

use crate::domain::member::PersonalLeave;
use crate::repository::columns::decode_date;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct PersonalLeaveRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PersonalLeaveRepository {
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

    /// 保存请假 (同一团员同一天覆盖写)
    pub fn upsert(
        &self,
        member_id: i64,
        date: NaiveDate,
        reason: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO personal_schedules (member_id, date, reason)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (member_id, date) DO UPDATE SET reason = excluded.reason
            "#,
            params![member_id, date.format("%Y-%m-%d").to_string(), reason],
        )?;
        Ok(())
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(conn.execute("DELETE FROM personal_schedules WHERE id = ?1", params![id])?)
    }

    /// 团员在指定日期是否请假
    pub fn exists(&self, member_id: i64, date: NaiveDate) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM personal_schedules WHERE member_id = ?1 AND date = ?2 LIMIT 1",
                params![member_id, date.format("%Y-%m-%d").to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 查询团员的全部请假 (按日期排序)
    pub fn list_by_member(&self, member_id: i64) -> RepositoryResult<Vec<PersonalLeave>> {
        let rows: Vec<(i64, i64, String, Option<String>)> = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(
                r#"
                SELECT id, member_id, date, reason FROM personal_schedules
                WHERE member_id = ?1
                ORDER BY date
                "#,
            )?;
            let rows = stmt
                .query_map(params![member_id], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        rows.into_iter()
            .map(|(id, member_id, date, reason)| {
                Ok(PersonalLeave {
                    id,
                    member_id,
                    date: decode_date("personal_schedules.date", &date)?,
                    reason,
                })
            })
            .collect()
    }
}
