// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的过滤器: 本 crate 输出 info, 依赖库只输出 warn
pub const DEFAULT_FILTER: &str = "warn,playsee=info";

/// 读取 RUST_LOG, 未设置或无效时回落到 DEFAULT_FILTER
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: DEFAULT_FILTER）
///   例如: RUST_LOG=debug 或 RUST_LOG=playsee=trace
///
/// # 示例
/// ```no_run
/// use playsee::logging;
/// logging::init();
/// ```
pub fn init() {
    fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 以 JSON 格式初始化日志系统 (便于日志采集)
pub fn init_json() {
    fmt()
        .json()
        .with_env_filter(env_filter())
        .with_current_span(true)
        .init();
}

/// 初始化测试环境的日志系统 (本 crate 输出 debug, 重复调用无副作用)
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("warn,playsee=debug"))
        .with_test_writer()
        .try_init();
}
