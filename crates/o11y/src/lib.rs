//! Process observability: structured logging, Prometheus metrics and
//! panic capture, initialized together at startup.
//!
//! ```ignore
//! let cfg = o11y::O11yConfig {
//!     logging: o11y::logging::Config {
//!         level: Some("info".into()),
//!         ..Default::default()
//!     },
//!     metrics: o11y::df_metrics::Config { enable: true },
//!     install_panic_hook: true,
//! };
//! o11y::init_all(&cfg);
//! ```

pub mod df_metrics;
pub mod logging;
pub mod panic;

#[derive(Debug, Clone, Default)]
pub struct O11yConfig {
    pub logging: logging::Config,
    pub metrics: df_metrics::Config,
    pub install_panic_hook: bool,
}

/// Brings the whole observability stack up. Every piece is idempotent,
/// so calling this twice (tests, embedded setups) is harmless.
pub fn init_all(config: &O11yConfig) {
    logging::init(&config.logging);
    df_metrics::init(&config.metrics);
    if config.install_panic_hook {
        panic::install_panic_hook();
    }
}
