// ==========================================
// 剧团排班系统 - 命令行入口
// ==========================================
// 用法: playsee [--db PATH] [--log-json] YYYY-MM
// 输出: 自动分配结果 JSON (stdout), 运行摘要 (stderr)
// 退出码: 0 成功, 1 失败
// ==========================================

use anyhow::{anyhow, bail, Context};
use playsee::api::ApiError;
use playsee::app::{get_default_db_path, AppState};
use playsee::config::AssignmentConfigReader;
use playsee::i18n::{set_locale, t, t_with_args};
use playsee::logging;

/// 命令行参数
struct CliArgs {
    db_path: Option<String>,
    log_json: bool,
    year: i32,
    month: u32,
}

fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<CliArgs> {
    let mut db_path = None;
    let mut log_json = false;
    let mut target = None;

    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                db_path = Some(args.next().ok_or_else(|| anyhow!("--db 需要路径参数"))?);
            }
            "--log-json" => log_json = true,
            _ if target.is_none() => target = Some(arg),
            other => bail!("无法识别的参数: {}", other),
        }
    }

    let target = target.ok_or_else(|| anyhow!("用法: playsee [--db PATH] [--log-json] YYYY-MM"))?;
    let (year, month) = target
        .split_once('-')
        .ok_or_else(|| anyhow!("月份格式应为 YYYY-MM: {}", target))?;

    Ok(CliArgs {
        db_path,
        log_json,
        year: year.parse().with_context(|| format!("无效的年份: {}", year))?,
        month: month.parse().with_context(|| format!("无效的月份: {}", month))?,
    })
}

/// API 错误的本地化描述
fn describe(err: &ApiError, year: i32, month: u32) -> String {
    let target = format!("{:04}-{:02}", year, month);
    match err {
        ApiError::AssignmentInProgress => t("assignment.in_progress"),
        ApiError::NoSchedulesInRange { .. } => {
            t_with_args("assignment.no_schedules", &[("month", &target)])
        }
        ApiError::NoEligibleMembers => t("assignment.no_members"),
        other => other.to_string(),
    }
}

async fn run(cli: CliArgs) -> anyhow::Result<()> {
    let db_path = cli.db_path.unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    let locale = state
        .config_manager
        .get_locale()
        .await
        .map_err(|e| anyhow!("读取语言配置失败: {}", e))?;
    set_locale(&locale);

    let response = match state
        .assignment_api
        .run_auto_assignment(cli.year, cli.month)
        .await
    {
        Ok(response) => response,
        Err(e) => bail!(describe(&e, cli.year, cli.month)),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    eprintln!(
        "{}",
        t_with_args(
            "assignment.summary",
            &[
                ("month", &format!("{:04}-{:02}", response.year, response.month)),
                ("success", &response.success_count.to_string()),
                ("failure", &response.failure_count.to_string()),
            ],
        )
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = match parse_args(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("{} v{}", playsee::APP_NAME, playsee::VERSION);

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "自动分配失败");
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
