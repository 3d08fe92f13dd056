use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr so that
/// commands printing to stdout (`simulate`, `config`) stay clean.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    tracing::info!("Food order bot telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the log lines of one command
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span carrying the attributes of one order command
pub fn create_command_span(
    command: &str,
    channel_id: u64,
    user_id: u64,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "order_command",
        command = command,
        channel.id = channel_id,
        user.id = user_id,
        correlation.id = correlation_id,
    )
}
