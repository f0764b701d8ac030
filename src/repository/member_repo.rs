// ==========================================
// 剧团排班系统 - 团员数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 表: members / member_performances
// ==========================================

use crate::domain::member::{Member, MemberPerformance, NewMember};
use crate::domain::types::{parse_weekday_label, weekday_label, TimeRange};
use crate::repository::columns::{decode_string_list, encode_string_list};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::warn;

struct MemberRow {
    id: i64,
    name: String,
    auto_assign: bool,
    max_monthly: i64,
    avoid_times: Option<String>,
    avoid_days: Option<String>,
    memo: Option<String>,
}

const MEMBER_COLUMNS: &str =
    "id, name, auto_assign, max_monthly, avoid_times, avoid_days, memo";

// ==========================================
// MemberRepository - 团员仓储
// ==========================================
pub struct MemberRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MemberRepository {
    /// 创建新的 MemberRepository 实例
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

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // members
    // ==========================================

    /// 创建团员, 返回新 id
    pub fn create(&self, member: &NewMember) -> RepositoryResult<i64> {
        let (avoid_times, avoid_days) = encode_avoidance(member)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO members (name, auto_assign, max_monthly, avoid_times, avoid_days, memo)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                member.name,
                member.auto_assign,
                member.max_monthly,
                avoid_times,
                avoid_days,
                member.memo,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按 id 查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Member>> {
        let row = {
            let conn = self.get_conn()?;
            conn.query_row(
                &format!("SELECT {} FROM members WHERE id = ?1", MEMBER_COLUMNS),
                params![id],
                read_member_row,
            )
            .optional()?
        };

        row.map(map_member).transpose()
    }

    /// 查询全部团员 (按姓名排序)
    pub fn list_all(&self) -> RepositoryResult<Vec<Member>> {
        self.query_members(&format!("SELECT {} FROM members ORDER BY name", MEMBER_COLUMNS))
    }

    /// 查询参与自动分配的团员 (按姓名排序)
    ///
    /// 说明: 排序是公平性平局规则的一部分, 不可省略
    pub fn list_auto_assign(&self) -> RepositoryResult<Vec<Member>> {
        self.query_members(&format!(
            "SELECT {} FROM members WHERE auto_assign = 1 ORDER BY name",
            MEMBER_COLUMNS
        ))
    }

    fn query_members(&self, sql: &str) -> RepositoryResult<Vec<Member>> {
        let rows = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map([], read_member_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        rows.into_iter().map(map_member).collect()
    }

    /// 更新团员
    pub fn update(&self, id: i64, member: &NewMember) -> RepositoryResult<()> {
        let (avoid_times, avoid_days) = encode_avoidance(member)?;
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE members
            SET name = ?1, auto_assign = ?2, max_monthly = ?3,
                avoid_times = ?4, avoid_days = ?5, memo = ?6
            WHERE id = ?7
            "#,
            params![
                member.name,
                member.auto_assign,
                member.max_monthly,
                avoid_times,
                avoid_days,
                member.memo,
                id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Member".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除团员 (级联删除其分配、可出演角色与请假记录)
    pub fn delete(&self, id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(conn.execute("DELETE FROM members WHERE id = ?1", params![id])?)
    }

    // ==========================================
    // member_performances
    // ==========================================

    /// 设置团员在某剧目中可出演的角色 (覆盖写)
    pub fn set_performance_roles(
        &self,
        member_id: i64,
        performance_id: i64,
        roles: &[String],
    ) -> RepositoryResult<()> {
        let encoded = encode_string_list(roles)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO member_performances (member_id, performance_id, available_roles)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (member_id, performance_id)
            DO UPDATE SET available_roles = excluded.available_roles
            "#,
            params![member_id, performance_id, encoded],
        )?;
        Ok(())
    }

    /// 整体替换团员的可出演角色 (事务内先删后插, 空角色列表不落库)
    pub fn replace_performance_roles(
        &self,
        member_id: i64,
        entries: &[MemberPerformance],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        tx.execute(
            "DELETE FROM member_performances WHERE member_id = ?1",
            params![member_id],
        )?;
        for entry in entries.iter().filter(|e| !e.available_roles.is_empty()) {
            tx.execute(
                r#"
                INSERT INTO member_performances (member_id, performance_id, available_roles)
                VALUES (?1, ?2, ?3)
                "#,
                params![
                    member_id,
                    entry.performance_id,
                    encode_string_list(&entry.available_roles)?
                ],
            )?;
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 查询团员在某剧目中可出演的角色
    ///
    /// # 返回
    /// - Ok(None): 无记录 (不能出演该剧目任何角色)
    pub fn find_available_roles(
        &self,
        member_id: i64,
        performance_id: i64,
    ) -> RepositoryResult<Option<Vec<String>>> {
        let raw: Option<Option<String>> = {
            let conn = self.get_conn()?;
            conn.query_row(
                r#"
                SELECT available_roles FROM member_performances
                WHERE member_id = ?1 AND performance_id = ?2
                "#,
                params![member_id, performance_id],
                |row| row.get(0),
            )
            .optional()?
        };

        raw.map(|roles| decode_string_list("member_performances.available_roles", roles))
            .transpose()
    }

    /// 查询团员的全部可出演记录
    pub fn list_performance_roles(&self, member_id: i64) -> RepositoryResult<Vec<MemberPerformance>> {
        let rows: Vec<(i64, i64, Option<String>)> = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(
                r#"
                SELECT member_id, performance_id, available_roles
                FROM member_performances
                WHERE member_id = ?1
                ORDER BY performance_id
                "#,
            )?;
            let rows = stmt
                .query_map(params![member_id], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        rows.into_iter()
            .map(|(member_id, performance_id, roles)| {
                Ok(MemberPerformance {
                    member_id,
                    performance_id,
                    available_roles: decode_string_list(
                        "member_performances.available_roles",
                        roles,
                    )?,
                })
            })
            .collect()
    }
}

fn read_member_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MemberRow> {
    Ok(MemberRow {
        id: row.get(0)?,
        name: row.get(1)?,
        auto_assign: row.get(2)?,
        max_monthly: row.get(3)?,
        avoid_times: row.get(4)?,
        avoid_days: row.get(5)?,
        memo: row.get(6)?,
    })
}

fn map_member(row: MemberRow) -> RepositoryResult<Member> {
    let avoid_times = decode_string_list("members.avoid_times", row.avoid_times)?
        .iter()
        .filter_map(|label| {
            let parsed = TimeRange::from_label(label);
            if parsed.is_none() {
                warn!(member_id = row.id, label = %label, "忽略无法识别的回避时段");
            }
            parsed
        })
        .collect();

    let avoid_days = decode_string_list("members.avoid_days", row.avoid_days)?
        .iter()
        .filter_map(|label| {
            let parsed = parse_weekday_label(label);
            if parsed.is_none() {
                warn!(member_id = row.id, label = %label, "忽略无法识别的回避星期");
            }
            parsed
        })
        .collect();

    let max_monthly = u32::try_from(row.max_monthly).map_err(|_| RepositoryError::FieldValueError {
        field: "members.max_monthly".to_string(),
        message: format!("每月上限不能为负数: {}", row.max_monthly),
    })?;

    Ok(Member {
        id: row.id,
        name: row.name,
        auto_assign: row.auto_assign,
        max_monthly,
        avoid_times,
        avoid_days,
        memo: row.memo,
    })
}

fn encode_avoidance(member: &NewMember) -> RepositoryResult<(String, String)> {
    let times: Vec<&str> = member.avoid_times.iter().map(|t| t.as_label()).collect();
    let days: Vec<&str> = member.avoid_days.iter().map(|d| weekday_label(*d)).collect();
    Ok((encode_string_list(&times)?, encode_string_list(&days)?))
}
