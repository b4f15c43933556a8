//! Prometheus metrics collection for stanzad.
//!
//! Metrics live in a process-wide registry and are recorded through the
//! `record_*` helpers, which are no-ops until [`init`] has run.
//!
//! - `stanzad_iq_total{module}` - IQs dispatched per module
//! - `stanzad_iq_duration_seconds{module}` - IQ processing latency
//! - `stanzad_iq_errors_total{module,error}` - handler errors
//! - `stanzad_iq_unhandled_total` - requests no module matched
//! - `stanzad_ping_timeouts_total` - sessions closed by the keepalive
//! - `stanzad_registrations_total{outcome}` - provisioning outcomes

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Dispatch
// ========================================================================

/// IQs processed per module.
pub static IQ_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// IQ processing latency per module.
pub static IQ_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Handler errors per module and error kind.
pub static IQ_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Request IQs answered with service-unavailable.
pub static IQ_UNHANDLED: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Modules
// ========================================================================

/// Sessions disconnected because a keepalive probe went unanswered.
pub static PING_TIMEOUTS: OnceLock<IntCounter> = OnceLock::new();

/// Provisioning outcomes (registered, cancelled, password_changed, or the
/// error condition name).
pub static REGISTRATIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup. Later calls leave the first set of metrics in
/// place and log the duplicate registration.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::error!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(IQ_COUNTER, IntCounterVec::new(Opts::new("stanzad_iq_total", "IQs processed by module"), &["module"]));
    register!(IQ_LATENCY, HistogramVec::new(
        HistogramOpts::new("stanzad_iq_duration_seconds", "IQ processing latency by module")
            .buckets(vec![0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
        &["module"]));
    register!(IQ_ERRORS, IntCounterVec::new(Opts::new("stanzad_iq_errors_total", "IQ handler errors by module"), &["module", "error"]));
    register!(IQ_UNHANDLED, IntCounter::new("stanzad_iq_unhandled_total", "Request IQs no module matched"));
    register!(PING_TIMEOUTS, IntCounter::new("stanzad_ping_timeouts_total", "Sessions closed by keepalive timeout"));
    register!(REGISTRATIONS, IntCounterVec::new(Opts::new("stanzad_registrations_total", "In-band registration outcomes"), &["outcome"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recording helpers
// ============================================================================

/// Record one dispatched IQ with its latency.
#[inline]
pub fn record_iq(module: &str, duration_secs: f64) {
    if let Some(c) = IQ_COUNTER.get() {
        c.with_label_values(&[module]).inc();
    }
    if let Some(h) = IQ_LATENCY.get() {
        h.with_label_values(&[module]).observe(duration_secs);
    }
}

/// Record a handler error.
#[inline]
pub fn record_iq_error(module: &str, error: &str) {
    if let Some(c) = IQ_ERRORS.get() {
        c.with_label_values(&[module, error]).inc();
    }
}

/// Record a request IQ that no module claimed.
#[inline]
pub fn record_unhandled() {
    if let Some(c) = IQ_UNHANDLED.get() {
        c.inc();
    }
}

/// Record a keepalive timeout.
#[inline]
pub fn record_ping_timeout() {
    if let Some(c) = PING_TIMEOUTS.get() {
        c.inc();
    }
}

/// Record a provisioning outcome.
#[inline]
pub fn record_registration(outcome: &str) {
    if let Some(c) = REGISTRATIONS.get() {
        c.with_label_values(&[outcome]).inc();
    }
}
