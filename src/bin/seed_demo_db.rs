// ==========================================
// 剧团排班系统 - 演示数据库生成工具
// ==========================================
// 用法: seed_demo_db [PATH]
// 说明: 目标库已存在时先备份再重建; 生成 2024-09 的剧目/团员/场次
// ==========================================

use chrono::{Local, NaiveDate, NaiveDateTime, Weekday};
use std::error::Error;
use std::fs;
use std::path::Path;

use playsee::app::{get_default_db_path, AppState};
use playsee::config::AssignmentConfigReader;
use playsee::domain::types::TimeRange;
use playsee::{NewMember, NewPerformance, NewSchedule, ScheduleStatus};

/// (剧目名, 角色, 备注)
const PERFORMANCES: [(&str, [&str; 3], &str); 4] = [
    ("햄릿", ["햄릿", "오필리아", "클로디어스"], "셰익스피어 작품"),
    ("로미오와 줄리엣", ["로미오", "줄리엣", "머큐시오"], "사랑 이야기"),
    ("맥베스", ["맥베스", "레이디 맥베스", "던칸"], "비극 작품"),
    ("리어왕", ["리어왕", "코델리아", "고네릴"], "가족 갈등"),
];

const MEMBERS: [&str; 10] = [
    "김철수", "이영희", "박민수", "최지영", "정현우", "조미영", "윤석진", "한소영", "임동욱", "강지은",
];

/// (日期, 集合时间, 开演时间, 剧目名, 场馆)
const SCHEDULES: [(&str, &str, &str, &str, &str); 16] = [
    ("2024-09-02", "08:00", "10:00", "햄릿", "대학로 소극장"),
    ("2024-09-03", "08:30", "10:00", "로미오와 줄리엣", "홍대 아트센터"),
    ("2024-09-03", "09:00", "14:00", "로미오와 줄리엣", "홍대 아트센터"),
    ("2024-09-04", "08:00", "11:00", "햄릿", "강남 문화회관"),
    ("2024-09-04", "08:30", "11:00", "햄릿", "종로구민회관"),
    ("2024-09-05", "08:00", "10:00", "맥베스", "성동구 문화회관"),
    ("2024-09-05", "09:00", "12:00", "리어왕", "마포 아트센터"),
    ("2024-09-06", "08:00", "10:00", "햄릿", "대학로 소극장"),
    ("2024-09-06", "08:30", "11:00", "로미오와 줄리엣", "홍대 아트센터"),
    ("2024-09-06", "09:00", "14:00", "맥베스", "강남 문화회관"),
    ("2024-09-07", "08:00", "10:00", "리어왕", "세종문화회관"),
    ("2024-09-07", "08:30", "14:00", "리어왕", "세종문화회관"),
    ("2024-09-09", "08:00", "11:00", "햄릿", "종로구민회관"),
    ("2024-09-10", "08:00", "10:00", "맥베스", "대학로 소극장"),
    ("2024-09-10", "08:30", "12:00", "맥베스", "대학로 소극장"),
    ("2024-09-10", "09:00", "14:00", "로미오와 줄리엣", "홍대 아트센터"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    playsee::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    let state = AppState::new(db_path.clone())?;
    let default_max_monthly = state.config_manager.get_default_max_monthly().await?;
    seed_demo(&state, default_max_monthly)?;
    print_quick_counts(&state)?;

    eprintln!("Seeded {}", db_path);
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_demo(state: &AppState, default_max_monthly: u32) -> Result<(), Box<dyn Error>> {
    let repos = &state.repositories;

    // 剧目
    let mut performance_ids = Vec::with_capacity(PERFORMANCES.len());
    for (name, roles, notes) in PERFORMANCES {
        let id = repos.performance_repo.create(&NewPerformance {
            name: name.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            notes: Some(notes.to_string()),
        })?;
        performance_ids.push((name, id, roles));
    }

    // 团员 (部分带回避/上限, 便于观察约束效果)
    for (index, name) in MEMBERS.iter().enumerate() {
        let mut member = NewMember::named(name);
        member.max_monthly = default_max_monthly;
        match index {
            0 => member.avoid_times = vec![TimeRange::Evening],
            1 => member.avoid_days = vec![Weekday::Sat],
            2 => member.max_monthly = 3,
            _ => {}
        }
        let member_id = repos.member_repo.create(&member)?;

        // 每个团员可出演其中三部剧目的全部角色
        for (p_index, (_, performance_id, roles)) in performance_ids.iter().enumerate() {
            if (index + p_index) % 4 == 3 {
                continue;
            }
            let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
            repos
                .member_repo
                .set_performance_roles(member_id, *performance_id, &roles)?;
        }

        if index == 3 {
            let date = NaiveDate::from_ymd_opt(2024, 9, 6).ok_or("invalid leave date")?;
            repos.leave_repo.upsert(member_id, date, Some("개인 일정"))?;
        }
    }

    // 场次
    for (index, (date, call, start, performance, venue)) in SCHEDULES.into_iter().enumerate() {
        let Some((_, performance_id, _)) = performance_ids.iter().find(|(n, _, _)| *n == performance)
        else {
            eprintln!("공연을 찾을 수 없음: {}", performance);
            continue;
        };
        let schedule_id = repos.schedule_repo.create(&NewSchedule {
            performance_id: *performance_id,
            call_time: parse_local(date, call)?,
            start_time: parse_local(date, start)?,
            venue: venue.to_string(),
        })?;

        // 前两场已完成, 第六场取消
        let status = match index {
            0 | 1 => Some(ScheduleStatus::Completed),
            5 => Some(ScheduleStatus::Cancelled),
            _ => None,
        };
        if let Some(status) = status {
            repos.schedule_repo.update_status(schedule_id, status)?;
        }
    }

    Ok(())
}

fn parse_local(date: &str, time: &str) -> Result<NaiveDateTime, Box<dyn Error>> {
    Ok(NaiveDateTime::parse_from_str(
        &format!("{} {}", date, time),
        "%Y-%m-%d %H:%M",
    )?)
}

fn print_quick_counts(state: &AppState) -> Result<(), Box<dyn Error>> {
    let repos = &state.repositories;
    let performances = repos.performance_repo.list_all()?.len();
    let members = repos.member_repo.list_all()?.len();
    let schedules = repos
        .schedule_repo
        .list_by_call_date_range(
            repos.clock(),
            NaiveDate::from_ymd_opt(2024, 9, 1).ok_or("invalid date")?,
            NaiveDate::from_ymd_opt(2024, 9, 30).ok_or("invalid date")?,
        )?
        .len();

    eprintln!(
        "performances={} members={} schedules(2024-09)={}",
        performances, members, schedules
    );
    Ok(())
}
