//! # Adaptor Telemetry
//!
//! Structured logging and Prometheus metrics shared by the queue dispatch
//! adaptor and the fake spine test double.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use adaptor_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env()).expect("telemetry");
//!     // dispatch messages...
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `QD_SERVICE_NAME` | `queue-dispatch` | Service name attached to log lines |
//! | `QD_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `QD_JSON_LOGS` | `false` | Emit JSON log lines |
//! | `QD_CONSOLE_OUTPUT` | `true` | Write log lines to stdout |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, DispatchOutcomeLabel, HistogramTimer, MetricsHandle,
    DISPATCHES_IN_FLIGHT, DISPATCH_DURATION, DISPATCH_TOTAL, SPINE_REQUESTS,
};

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global tracing subscriber could not be installed.
    #[error("Failed to initialize logger: {0}")]
    LoggerInit(String),

    /// A collector could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Guard returned by [`init_telemetry`]. Hold it for the lifetime of the process.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}

/// Register metrics and install the global log subscriber.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Log a dispatch event with the standard `host` and `correlation_id` fields.
///
/// ```rust,ignore
/// log_dispatch_event!(info, "Message sent", host, correlation_id, credit = 3);
/// ```
#[macro_export]
macro_rules! log_dispatch_event {
    ($level:ident, $msg:expr, $host:expr, $correlation_id:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            host = %$host,
            correlation_id = %$correlation_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Increment a counter, optionally with label values.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
