// ==========================================
// 自动分配引擎集成测试
// ==========================================
// 测试目标: 基于临时 SQLite 数据库验证完整的分配流程
// ==========================================


use chrono::{NaiveDate, Weekday};
use playsee::domain::types::TimeRange;
use playsee::engine::{AssignmentError, AutoAssignEngine, RepositoryDataSource};
use playsee::logging;
use playsee::{ManualAssignmentInput, NewMember, VenueClock};
use std::collections::HashSet;
use std::sync::Arc;
use test_helpers::*;

fn engine(env: &TestEnv) -> AutoAssignEngine<RepositoryDataSource> {
    AutoAssignEngine::new(Arc::new(env.repos().clone()))
}

/// 两角色、两团员
fn two_role_env() -> (TestEnv, i64, i64, i64) {
    let env = create_test_env();
    let repos = env.repos();
    let perf = add_performance(repos, "햄릿", &["A", "B"]);
    let m1 = add_member(repos, "M1");
    let m2 = add_member(repos, "M2");
    allow(repos, m1, perf, &["A", "B"]);
    allow(repos, m2, perf, &["A", "B"]);
    let schedule = add_schedule(repos, perf, "2024-09-03 10:00");
    (env, schedule, m1, m2)
}

// ==========================================
// 基础场景
// ==========================================

#[test]
fn test_two_role_example_persists_auto_rows() {
    logging::init_test();
    let (env, schedule, m1, m2) = two_role_env();

    let results = engine(&env).run(2024, 9).unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(
        snapshot(env.repos(), schedule),
        vec![("A".to_string(), m1, false), ("B".to_string(), m2, false)]
    );
    assert_eq!(results[0].assignments[0].member_name, "M1");
}

#[test]
fn test_rerun_produces_identical_assignments() {
    let env = create_test_env();
    let repos = env.repos();
    let perf = add_performance(repos, "맥베스", &["맥베스", "레이디 맥베스", "던칸"]);
    for name in ["김철수", "이영희", "박민수", "최지영"] {
        let id = add_member(repos, name);
        allow(repos, id, perf, &["맥베스", "레이디 맥베스", "던칸"]);
    }
    let s1 = add_schedule(repos, perf, "2024-09-10 08:00");
    let s2 = add_schedule(repos, perf, "2024-09-10 08:30");
    let s3 = add_schedule(repos, perf, "2024-09-12 19:00");

    engine(&env).run(2024, 9).unwrap();
    let first: Vec<_> = [s1, s2, s3].iter().map(|s| snapshot(repos, *s)).collect();

    engine(&env).run(2024, 9).unwrap();
    let second: Vec<_> = [s1, s2, s3].iter().map(|s| snapshot(repos, *s)).collect();

    assert_eq!(first, second);
    assert!(first.iter().all(|rows| rows.len() == 3));
}

#[test]
fn test_same_day_schedules_share_the_team() {
    let env = create_test_env();
    let repos = env.repos();
    let perf = add_performance(repos, "리어왕", &["리어왕", "코델리아"]);
    for name in ["가", "나", "다", "라"] {
        let id = add_member(repos, name);
        allow(repos, id, perf, &["리어왕", "코델리아"]);
    }
    let morning = add_schedule(repos, perf, "2024-09-07 09:00");
    let afternoon = add_schedule(repos, perf, "2024-09-07 13:30");

    engine(&env).run(2024, 9).unwrap();

    assert_eq!(snapshot(repos, morning), snapshot(repos, afternoon));
}

// ==========================================
// 约束
// ==========================================

#[test]
fn test_manual_rows_survive_a_run() {
    let (env, schedule, m1, m2) = two_role_env();
    env.repos()
        .assignment_repo
        .replace_with_manual(
            schedule,
            &[ManualAssignmentInput {
                member_id: m2,
                role: "A".to_string(),
            }],
        )
        .unwrap();

    let results = engine(&env).run(2024, 9).unwrap();

    assert!(results[0].success);
    assert_eq!(
        snapshot(env.repos(), schedule),
        vec![("A".to_string(), m2, true), ("B".to_string(), m1, false)]
    );
}

#[test]
fn test_monthly_cap_counts_persisted_rows() {
    let env = create_test_env();
    let repos = env.repos();
    let perf = add_performance(repos, "햄릿", &["햄릿"]);
    let capped = add_member_with(
        repos,
        NewMember {
            max_monthly: 1,
            ..NewMember::named("가")
        },
    );
    let other = add_member(repos, "나");
    allow(repos, capped, perf, &["햄릿"]);
    allow(repos, other, perf, &["햄릿"]);

    let manual = add_schedule(repos, perf, "2024-09-02 10:00");
    let auto = add_schedule(repos, perf, "2024-09-20 10:00");
    repos
        .assignment_repo
        .replace_with_manual(
            manual,
            &[ManualAssignmentInput {
                member_id: capped,
                role: "햄릿".to_string(),
            }],
        )
        .unwrap();

    engine(&env).run(2024, 9).unwrap();

    assert_eq!(snapshot(repos, auto), vec![("햄릿".to_string(), other, false)]);
}

#[test]
fn test_avoidance_and_leave_are_enforced() {
    let env = create_test_env();
    let repos = env.repos();
    let perf = add_performance(repos, "햄릿", &["햄릿"]);
    let night_owl = add_member_with(
        repos,
        NewMember {
            avoid_times: vec![TimeRange::Night],
            ..NewMember::named("가")
        },
    );
    let monday_off = add_member_with(
        repos,
        NewMember {
            avoid_days: vec![Weekday::Mon],
            ..NewMember::named("나")
        },
    );
    let on_leave = add_member(repos, "다");
    let fallback = add_member(repos, "라");
    for id in [night_owl, monday_off, on_leave, fallback] {
        allow(repos, id, perf, &["햄릿"]);
    }
    repos
        .leave_repo
        .upsert(on_leave, NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(), Some("병원"))
        .unwrap();

    // 2024-09-02 为周一, 08:00 属于夜间时段
    let schedule = add_schedule(repos, perf, "2024-09-02 08:00");

    engine(&env).run(2024, 9).unwrap();

    assert_eq!(snapshot(repos, schedule), vec![("햄릿".to_string(), fallback, false)]);
}

#[test]
fn test_gap_hours_ignore_avoided_time_ranges() {
    let env = create_test_env();
    let repos = env.repos();
    let perf = add_performance(repos, "햄릿", &["햄릿"]);
    let member = add_member_with(
        repos,
        NewMember {
            avoid_times: vec![
                TimeRange::Morning,
                TimeRange::Afternoon,
                TimeRange::Evening,
                TimeRange::Night,
            ],
            ..NewMember::named("가")
        },
    );
    allow(repos, member, perf, &["햄릿"]);
    let noon = add_schedule(repos, perf, "2024-09-03 12:00");
    let five = add_schedule(repos, perf, "2024-09-04 17:30");
    let evening = add_schedule(repos, perf, "2024-09-05 19:00");

    let results = engine(&env).run(2024, 9).unwrap();

    assert_eq!(snapshot(repos, noon).len(), 1);
    assert_eq!(snapshot(repos, five).len(), 1);
    assert!(snapshot(repos, evening).is_empty());
    assert!(!results[2].success);
}

#[test]
fn test_members_are_unique_within_each_schedule() {
    let env = create_test_env();
    let repos = env.repos();
    let hamlet = add_performance(repos, "햄릿", &["햄릿", "오필리아", "클로디어스"]);
    let romeo = add_performance(repos, "로미오와 줄리엣", &["로미오", "줄리엣", "머큐시오"]);
    for (i, name) in ["가", "나", "다", "라", "마"].iter().enumerate() {
        let id = add_member(repos, name);
        allow(repos, id, hamlet, &["햄릿", "오필리아", "클로디어스"]);
        if i % 2 == 0 {
            allow(repos, id, romeo, &["로미오", "줄리엣", "머큐시오"]);
        }
    }
    let schedules = [
        add_schedule(repos, hamlet, "2024-09-04 08:00"),
        add_schedule(repos, hamlet, "2024-09-04 08:30"),
        add_schedule(repos, romeo, "2024-09-04 14:00"),
        add_schedule(repos, romeo, "2024-09-06 09:00"),
        add_schedule(repos, hamlet, "2024-09-09 08:00"),
    ];

    engine(&env).run(2024, 9).unwrap();

    for schedule in schedules {
        let rows = snapshot(repos, schedule);
        let members: HashSet<i64> = rows.iter().map(|(_, m, _)| *m).collect();
        assert_eq!(members.len(), rows.len(), "schedule {} 有重复团员", schedule);
        assert_eq!(rows.len(), 3);
    }
}

#[test]
fn test_team_is_scoped_to_performance() {
    let env = create_test_env();
    let repos = env.repos();
    let p = add_performance(repos, "햄릿", &["A"]);
    let q = add_performance(repos, "맥베스", &["A"]);
    let x = add_member(repos, "가");
    let y = add_member(repos, "나");
    allow(repos, x, p, &["A"]);
    allow(repos, x, q, &["A"]);
    allow(repos, y, q, &["A"]);
    let p_morning = add_schedule(repos, p, "2024-09-03 09:00");
    let q_morning = add_schedule(repos, q, "2024-09-03 10:00");
    let p_afternoon = add_schedule(repos, p, "2024-09-03 14:00");

    let results = engine(&env).run(2024, 9).unwrap();

    assert!(results.iter().all(|r| r.success));
    assert_eq!(snapshot(repos, p_morning), vec![("A".to_string(), x, false)]);
    assert_eq!(snapshot(repos, q_morning), vec![("A".to_string(), y, false)]);
    // 맥베스 的团队 (나) 不能出演 햄릿
    assert_eq!(snapshot(repos, p_afternoon), vec![("A".to_string(), x, false)]);
}

#[test]
fn test_monthly_cap_counts_rows_saved_in_same_run() {
    let env = create_test_env();
    let repos = env.repos();
    let perf = add_performance(repos, "햄릿", &["햄릿"]);
    let member = add_member_with(
        repos,
        NewMember {
            max_monthly: 1,
            ..NewMember::named("가")
        },
    );
    allow(repos, member, perf, &["햄릿"]);
    let first = add_schedule(repos, perf, "2024-09-03 10:00");
    let second = add_schedule(repos, perf, "2024-09-10 10:00");

    let results = engine(&env).run(2024, 9).unwrap();

    let outcomes: Vec<bool> = results.iter().map(|r| r.success).collect();
    assert_eq!(outcomes, vec![true, false]);
    assert_eq!(snapshot(repos, first), vec![("햄릿".to_string(), member, false)]);
    assert!(snapshot(repos, second).is_empty());
}

#[test]
fn test_unreadable_timestamp_does_not_abort_month() {
    let env = create_test_env();
    let repos = env.repos();
    let perf = add_performance(repos, "햄릿", &["햄릿"]);
    let member = add_member(repos, "가");
    allow(repos, member, perf, &["햄릿"]);
    let valid = add_schedule(repos, perf, "2024-09-03 10:00");
    let broken = add_raw_schedule(&env.db_path, perf, "2024-09-15 soon");

    let results = engine(&env).run(2024, 9).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].schedule.id, valid);
    assert!(results[0].success);
    assert_eq!(snapshot(repos, valid), vec![("햄릿".to_string(), member, false)]);
    assert!(snapshot(repos, broken).is_empty());
}

// ==========================================
// 时区
// ==========================================

#[test]
fn test_offset_timestamps_use_venue_local_dates() {
    let env = create_test_env();
    let repos = env.repos();
    let perf = add_performance(repos, "햄릿", &["햄릿"]);
    let member = add_member(repos, "가");
    allow(repos, member, perf, &["햄릿"]);

    // UTC 8/31 23:30 => KST 9/1 08:30
    let first_day = add_raw_schedule(&env.db_path, perf, "2024-08-31T23:30:00Z");
    // UTC 9/30 16:00 => KST 10/1 01:00
    let next_month = add_raw_schedule(&env.db_path, perf, "2024-09-30T16:00:00Z");

    let results = engine(&env).run(2024, 9).unwrap();

    let ids: Vec<i64> = results.iter().map(|r| r.schedule.id).collect();
    assert_eq!(ids, vec![first_day]);
    assert_eq!(results[0].schedule.call_time, local("2024-09-01 08:30"));

    // UTC 场馆下, 同一场次落在 8 月
    let utc = AutoAssignEngine::new(Arc::new(
        env.repos()
            .clone()
            .with_clock(VenueClock::from_offset_minutes(0).unwrap()),
    ));
    let august = utc.run(2024, 8).unwrap();
    assert_eq!(august.len(), 1);
    assert_eq!(august[0].schedule.id, first_day);
    assert!(snapshot(repos, next_month).is_empty());
}

// ==========================================
// 前置条件
// ==========================================

#[test]
fn test_preconditions_abort_before_writes() {
    let (env, schedule, _, _) = two_role_env();

    assert!(matches!(
        engine(&env).run(2024, 10),
        Err(AssignmentError::NoSchedulesInRange { .. })
    ));
    assert!(matches!(
        engine(&env).run(2024, 13),
        Err(AssignmentError::InvalidMonth { .. })
    ));

    for member in env.repos().member_repo.list_all().unwrap() {
        env.repos()
            .member_repo
            .update(
                member.id,
                &NewMember {
                    auto_assign: false,
                    ..NewMember::named(&member.name)
                },
            )
            .unwrap();
    }
    assert!(matches!(
        engine(&env).run(2024, 9),
        Err(AssignmentError::NoEligibleMembers)
    ));
    assert!(snapshot(env.repos(), schedule).is_empty());
}
