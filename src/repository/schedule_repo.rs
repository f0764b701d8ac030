// ==========================================
// 剧团排班系统 - 场次数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 时间策略:
// - 写库: 场馆本地时间 (TIMESTAMP_FORMAT)
// - 读库: VenueClock 统一换算到场馆本地时间
// - 日期范围: SQL 先按文本前缀宽松预筛 (±1 天), 再按场馆本地日期精确过滤
// - 范围查询中时间戳无法解析的行跳过 (warn), 按 id 查询仍返回错误
// ==========================================

use crate::domain::schedule::{NewSchedule, Schedule, ScheduleStatus, VenueStats};
use crate::domain::types::{VenueClock, TIMESTAMP_FORMAT};
use crate::repository::columns::decode_timestamp;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::warn;

type ScheduleRow = (i64, i64, String, String, String, String);

const SCHEDULE_COLUMNS: &str = "id, performance_id, call_time, start_time, venue, status";

// ==========================================
// ScheduleRepository - 场次仓储
// ==========================================
pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
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

    /// 创建场次, 返回新 id
    pub fn create(&self, schedule: &NewSchedule) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO schedules (performance_id, call_time, start_time, venue)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                schedule.performance_id,
                schedule.call_time.format(TIMESTAMP_FORMAT).to_string(),
                schedule.start_time.format(TIMESTAMP_FORMAT).to_string(),
                schedule.venue,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 更新场次
    pub fn update(&self, id: i64, schedule: &NewSchedule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE schedules
            SET performance_id = ?1, call_time = ?2, start_time = ?3, venue = ?4
            WHERE id = ?5
            "#,
            params![
                schedule.performance_id,
                schedule.call_time.format(TIMESTAMP_FORMAT).to_string(),
                schedule.start_time.format(TIMESTAMP_FORMAT).to_string(),
                schedule.venue,
                id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除场次 (级联删除其分配)
    pub fn delete(&self, id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        Ok(conn.execute("DELETE FROM schedules WHERE id = ?1", params![id])?)
    }

    /// 按 id 查询
    pub fn find_by_id(&self, clock: &VenueClock, id: i64) -> RepositoryResult<Option<Schedule>> {
        let row: Option<ScheduleRow> = {
            let conn = self.get_conn()?;
            conn.query_row(
                &format!("SELECT {} FROM schedules WHERE id = ?1", SCHEDULE_COLUMNS),
                params![id],
                read_schedule_row,
            )
            .optional()?
        };

        row.map(|r| map_schedule(clock, r)).transpose()
    }

    /// 查询场馆本地日期落在 [start, end] (含) 内的场次, 按集合时间升序
    pub fn list_by_call_date_range(
        &self,
        clock: &VenueClock,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<Schedule>> {
        let (lower, upper) = widened_bounds(start, end);
        let rows: Vec<ScheduleRow> = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(&format!(
                r#"
                SELECT {} FROM schedules
                WHERE substr(call_time, 1, 10) BETWEEN ?1 AND ?2
                ORDER BY call_time, id
                "#,
                SCHEDULE_COLUMNS
            ))?;
            let rows = stmt
                .query_map(params![lower, upper], read_schedule_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut schedules = map_schedules_lenient(clock, rows);
        schedules.retain(|s| (start..=end).contains(&s.call_date()));
        // 文本排序与带偏移时间戳的本地时间顺序可能不一致, 此处按本地时间重排 (稳定)
        schedules.sort_by(|a, b| a.call_time.cmp(&b.call_time));
        Ok(schedules)
    }

    /// 查询同日场次: 同剧目、同一场馆本地日期, 排除自身, 按集合时间升序
    pub fn list_same_day(
        &self,
        clock: &VenueClock,
        schedule: &Schedule,
    ) -> RepositoryResult<Vec<Schedule>> {
        let date = schedule.call_date();
        let (lower, upper) = widened_bounds(date, date);
        let rows: Vec<ScheduleRow> = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(&format!(
                r#"
                SELECT {} FROM schedules
                WHERE performance_id = ?1 AND id != ?2
                  AND substr(call_time, 1, 10) BETWEEN ?3 AND ?4
                ORDER BY call_time, id
                "#,
                SCHEDULE_COLUMNS
            ))?;
            let rows = stmt
                .query_map(
                    params![schedule.performance_id, schedule.id, lower, upper],
                    read_schedule_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut schedules = map_schedules_lenient(clock, rows);
        schedules.retain(|s| s.call_date() == date);
        schedules.sort_by(|a, b| a.call_time.cmp(&b.call_time));
        Ok(schedules)
    }

    // ==========================================
    // 状态与统计
    // ==========================================

    /// 更新场次状态
    pub fn update_status(&self, id: i64, status: ScheduleStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE schedules SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 按场馆统计场次 (开演时间的场馆本地日期落在 [start, end] 内, 边界可省略)
    ///
    /// # 返回
    /// 按最近开演时间降序, 同时间按场馆名升序
    pub fn venue_stats(
        &self,
        clock: &VenueClock,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<VenueStats>> {
        let lower = start
            .map(|d| (d - Duration::days(1)).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "0000-00-00".to_string());
        let upper = end
            .map(|d| (d + Duration::days(1)).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "9999-99-99".to_string());

        let rows: Vec<(i64, String, String, String, Option<String>)> = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(
                r#"
                SELECT s.id, s.venue, s.start_time, s.status, p.name
                FROM schedules s
                LEFT JOIN performances p ON s.performance_id = p.id
                WHERE substr(s.start_time, 1, 10) BETWEEN ?1 AND ?2
                "#,
            )?;
            let rows = stmt
                .query_map(params![lower, upper], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        let mut by_venue: BTreeMap<String, (VenueStats, BTreeSet<String>)> = BTreeMap::new();
        for (id, venue, raw_start, raw_status, performance_name) in rows {
            let start_time = match decode_timestamp(clock, "schedules.start_time", &raw_start) {
                Ok(t) => t,
                Err(e) => {
                    warn!(schedule_id = id, error = %e, "统计时跳过时间戳无效的场次");
                    continue;
                }
            };
            let date = start_time.date();
            if start.is_some_and(|d| date < d) || end.is_some_and(|d| date > d) {
                continue;
            }

            let (stats, names) = by_venue.entry(venue.clone()).or_insert_with(|| {
                (
                    VenueStats {
                        venue,
                        total_count: 0,
                        completed_count: 0,
                        cancelled_count: 0,
                        latest_start: start_time,
                        performance_names: Vec::new(),
                    },
                    BTreeSet::new(),
                )
            });
            stats.total_count += 1;
            match decode_status(id, &raw_status) {
                ScheduleStatus::Completed => stats.completed_count += 1,
                ScheduleStatus::Cancelled => stats.cancelled_count += 1,
                ScheduleStatus::Pending => {}
            }
            stats.latest_start = stats.latest_start.max(start_time);
            if let Some(name) = performance_name {
                names.insert(name);
            }
        }

        let mut stats: Vec<VenueStats> = by_venue
            .into_values()
            .map(|(mut stats, names)| {
                stats.performance_names = names.into_iter().collect();
                stats
            })
            .collect();
        stats.sort_by(|a, b| {
            b.latest_start
                .cmp(&a.latest_start)
                .then_with(|| a.venue.cmp(&b.venue))
        });
        Ok(stats)
    }
}

/// 文本预筛范围 (前后各放宽 1 天, 覆盖跨时区换算)
pub(crate) fn widened_bounds(start: NaiveDate, end: NaiveDate) -> (String, String) {
    let lower = start - Duration::days(1);
    let upper = end + Duration::days(1);
    (
        lower.format("%Y-%m-%d").to_string(),
        upper.format("%Y-%m-%d").to_string(),
    )
}

fn read_schedule_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduleRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

/// 范围查询的行映射: 时间戳无法解析的场次跳过并告警, 不影响其余场次
fn map_schedules_lenient(clock: &VenueClock, rows: Vec<ScheduleRow>) -> Vec<Schedule> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.0;
            match map_schedule(clock, row) {
                Ok(schedule) => Some(schedule),
                Err(e) => {
                    warn!(schedule_id = id, error = %e, "跳过时间戳无效的场次");
                    None
                }
            }
        })
        .collect()
}

fn map_schedule(clock: &VenueClock, row: ScheduleRow) -> RepositoryResult<Schedule> {
    let (id, performance_id, call_time, start_time, venue, status) = row;
    Ok(Schedule {
        id,
        performance_id,
        call_time: decode_timestamp(clock, "schedules.call_time", &call_time)?,
        start_time: decode_timestamp(clock, "schedules.start_time", &start_time)?,
        venue,
        status: decode_status(id, &status),
    })
}

/// 未知状态按 pending 处理
fn decode_status(schedule_id: i64, raw: &str) -> ScheduleStatus {
    ScheduleStatus::parse(raw).unwrap_or_else(|| {
        warn!(schedule_id, status = %raw, "未知的场次状态, 按 pending 处理");
        ScheduleStatus::Pending
    })
}
