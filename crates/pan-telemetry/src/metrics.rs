//! Prometheus metrics for the PAN pipeline.
//!
//! All metrics follow the naming convention: `pan_<stage>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., tokens_issued_total)
//! - **Histogram**: Distribution of values (e.g., derivation duration)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // FRAMER METRICS
    // =========================================================================

    /// Records that reached `ready`
    pub static ref RECORDS_COMPLETED: Counter = Counter::new(
        "pan_framer_records_completed_total",
        "Total number of PAN records that received their final digit"
    ).expect("metric creation failed");

    /// Records stopped before classification, by fault
    pub static ref RECORD_FAULTS: CounterVec = CounterVec::new(
        Opts::new("pan_record_faults_total", "Records suppressed by fault kind"),
        &["fault"]  // protocol / length / digit / checksum
    ).expect("metric creation failed");

    // =========================================================================
    // CLASSIFIER METRICS
    // =========================================================================

    /// Published classifications by outcome
    pub static ref CLASSIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("pan_classifier_lookups_total", "Published classifications"),
        &["outcome"]  // hit / miss
    ).expect("metric creation failed");

    // =========================================================================
    // TOKENIZER METRICS
    // =========================================================================

    /// Tokens issued
    pub static ref TOKENS_ISSUED: Counter = Counter::new(
        "pan_tokenizer_tokens_issued_total",
        "Total number of tokens derived for Luhn-valid records"
    ).expect("metric creation failed");

    /// Keystream derivation duration
    pub static ref TOKEN_DERIVATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "pan_tokenizer_derivation_duration_seconds",
            "Time spent deriving a token"
        ).buckets(exponential_buckets(0.000_001, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");

    /// Token bytes drained over the byte-multiplexed bus
    pub static ref TOKEN_BYTES_STREAMED: Counter = Counter::new(
        "pan_bus_token_bytes_streamed_total",
        "Token bytes presented on the byte-multiplexed output"
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(RECORDS_COMPLETED.clone()),
        Box::new(RECORD_FAULTS.clone()),
        Box::new(CLASSIFICATIONS.clone()),
        Box::new(TOKENS_ISSUED.clone()),
        Box::new(TOKEN_DERIVATION_DURATION.clone()),
        Box::new(TOKEN_BYTES_STREAMED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
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
