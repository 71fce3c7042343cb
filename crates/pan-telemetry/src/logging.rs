//! Structured logging.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! pretty (development) or JSON (containers) formatting layer. Log lines
//! carry the service name so several terminals can share one collector.
//! Logs go to stderr; stdout is left to the binary's own output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Initialize the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level` when both are set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if !config.console_output {
        registry
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);
        registry
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .with_writer(std::io::stderr);
        registry
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Structured logging configured"
    );

    Ok(())
}

/// Helper to create structured log entries with a consistent `stage` field.
#[macro_export]
macro_rules! log_event {
    (info, $stage:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            stage = $stage,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $stage:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            stage = $stage,
            $($($field)*,)?
            $msg
        )
    };

    (error, $stage:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            stage = $stage,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $stage:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            stage = $stage,
            $($($field)*,)?
            $msg
        )
    };
}
