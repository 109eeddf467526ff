// src/logging.rs

use crate::models::ApiCallLog;
use log::info;

/// Initializes the global logger. `RUST_LOG` wins over the configured level.
pub fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A second initialization (tests, embedding) is not an error worth surfacing.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

/// Formats an API call record. Only endpoint, summary and timing are logged.
pub fn format_api_call(log: &ApiCallLog) -> String {
    format!(
        "[{}] {} - {} - Status: {} - Time: {}ms",
        log.timestamp.to_rfc3339(),
        log.endpoint,
        log.request_summary,
        log.response_status,
        log.response_time_ms
    )
}

/// Logs an API call on the `api_calls` target.
pub fn log_api_call(log: &ApiCallLog) {
    info!(target: "api_calls", "{}", format_api_call(log));
}
