//! Prometheus metrics for message dispatch and the fake spine.
//!
//! All metrics follow the naming convention: `qd_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Registry holding every adaptor metric.
    pub static ref REGISTRY: Registry = Registry::new();

    /// Completed dispatch calls by outcome.
    pub static ref DISPATCH_TOTAL: CounterVec = CounterVec::new(
        Opts::new("qd_dispatch_total", "Completed dispatch calls by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Wall time of one connect/send/acknowledge handshake.
    pub static ref DISPATCH_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "qd_dispatch_duration_seconds",
            "Time spent driving one broker handshake"
        ).buckets(exponential_buckets(0.001, 2.0, 15).expect("valid buckets"))
    ).expect("metric creation failed");

    /// Handshakes currently occupying a worker thread.
    pub static ref DISPATCHES_IN_FLIGHT: Gauge = Gauge::new(
        "qd_dispatch_in_flight",
        "Handshakes currently running on worker threads"
    ).expect("metric creation failed");

    /// Requests seen by the fake spine.
    pub static ref SPINE_REQUESTS: CounterVec = CounterVec::new(
        Opts::new("qd_spine_requests_total", "Requests handled by the fake spine"),
        &["result"]  // matched/unmatched/matcher_error
    ).expect("metric creation failed");
}

/// Label values for [`DISPATCH_TOTAL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcomeLabel {
    /// Broker accepted the message.
    Accepted,
    /// Message never reached the broker.
    NotDelivered,
    /// Broker explicitly rejected the message.
    Rejected,
    /// Message was transmitted but acceptance was never observed.
    Unknown,
    /// The worker running the handshake died.
    WorkerFailure,
    /// The message could not be serialised.
    SerializationFailure,
}

impl DispatchOutcomeLabel {
    /// Prometheus label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::NotDelivered => "not_delivered",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
            Self::WorkerFailure => "worker_failure",
            Self::SerializationFailure => "serialization_failure",
        }
    }
}

/// Handle keeping the registry alive.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the adaptor registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(DISPATCH_TOTAL.clone()),
        Box::new(DISPATCH_DURATION.clone()),
        Box::new(DISPATCHES_IN_FLIGHT.clone()),
        Box::new(SPINE_REQUESTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
