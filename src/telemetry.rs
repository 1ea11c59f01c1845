//! 日志与指标
//! 初始化结构化日志，并定义客户端指标名称

use crate::config::ClientConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// 逻辑请求发送次数（按 attempt 区分首发与重试）
pub const REQUESTS_TOTAL: &str = "api_client_requests_total";
/// 检测到令牌失效的响应数
pub const STALE_RESPONSES_TOTAL: &str = "api_client_stale_responses_total";
/// 刷新流程结果（按 outcome 区分）
pub const REFRESH_TOTAL: &str = "api_client_refresh_total";

/// 初始化日志系统
pub fn init_telemetry(config: &ClientConfig) {
    // 环境变量优先于配置
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    // CLI 输出走 stdout，日志走 stderr
    let log_layer = match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer)
        .init();

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        level = %config.logging.level,
        format = %config.logging.format,
        "Telemetry initialized"
    );
}
