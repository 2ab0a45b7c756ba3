//! Structured logging configuration.
//!
//! This module provides structured logging with request correlation and
//! connection lifecycle tracking.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging.
///
/// Configurable log levels via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use decree_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("structured logging initialized");
}

/// Log a connection lifecycle event (connect, disconnect, reconnect).
#[allow(dead_code)]
pub fn log_connection_event(event_type: &str, player_id: Option<decree_engine::PlayerId>, message: &str) {
    tracing::info!(event_type = event_type, player_id = ?player_id, "{}", message);
}

/// Log API request/response.
#[allow(dead_code)]
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    tracing::info!(
        http_method = method,
        http_path = path,
        http_status = status_code,
        duration_ms = duration_ms,
        "API request completed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_connection_event() {
        log_connection_event("connect", Some(uuid::Uuid::new_v4()), "player connected");
        log_connection_event("disconnect", None, "socket closed");
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("GET", "/health", 200, 5);
        log_api_request("GET", "/stats", 200, 12);
    }
}
