//! Telemetry utilities: tracing setup and IQ timing.

use crate::config::{LogConfig, LogFormat};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Returns `false`
/// when a subscriber was already installed (tests, embedding servers).
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.is_ok()
}

/// Guard for timing IQ processing and recording metrics.
///
/// Records latency when dropped.
pub struct IqTimer {
    module: &'static str,
    start: Instant,
}

impl IqTimer {
    /// Start timing an IQ handled by `module`.
    pub fn new(module: &'static str) -> Self {
        Self {
            module,
            start: Instant::now(),
        }
    }
}

impl Drop for IqTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_iq(self.module, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, debug_span};

    /// Span for one dispatched IQ.
    pub fn iq(module: &str, id: &str, ty: &str) -> Span {
        debug_span!("iq", module = %module, id = %id, ty = %ty)
    }
}
