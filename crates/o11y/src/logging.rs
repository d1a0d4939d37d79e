//! Tracing subscriber setup.
//!
//! `RUST_LOG` always wins; the configured level is the fallback and
//! `info` the fallback's fallback. Records emitted through the `log`
//! facade by dependencies are bridged into tracing.

use std::sync::Once;

use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

static INIT: Once = Once::new();

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: Option<String>,
    /// Emit one JSON object per line instead of the human format.
    pub json: bool,
    /// Include module targets in the human format.
    pub with_targets: bool,
}

/// Installs the global subscriber. Safe to call more than once; only the
/// first call does anything.
pub fn init(config: &Config) {
    INIT.call_once(|| {
        let _ = LogTracer::init();

        let fallback =
            config.level.clone().unwrap_or_else(|| "info".to_string());
        let filter = EnvFilter::try_from_env("RUST_LOG")
            .or_else(|_| EnvFilter::try_new(fallback))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = if config.json {
            fmt::layer().json().flatten_event(true).boxed()
        } else {
            fmt::layer().with_target(config.with_targets).boxed()
        };

        let subscriber = Registry::default().with(filter).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
            .expect("failed to set global tracing subscriber");
    });
}
