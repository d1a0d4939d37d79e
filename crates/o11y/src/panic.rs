//! Global panic capture.
//!
//! Panics anywhere in the process land in the structured log and bump a
//! counter before the previous hook (usually the default backtrace
//! printer) runs.

use std::panic;

use metrics::counter;
use once_cell::sync::OnceCell;
use tracing::error;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Installs the hook once; later calls no-op.
pub fn install_panic_hook() {
    INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let thread = std::thread::current();
            let name = thread.name().unwrap_or("unnamed").to_string();
            let payload = info
                .payload()
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| {
                    info.payload().downcast_ref::<String>().cloned()
                })
                .unwrap_or_else(|| "unknown panic payload".to_string());
            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown".to_string());

            error!(%name, %location, %payload, "panic captured");
            counter!("driftforge_panics_total").increment(1);

            previous(info);
        }));
    });
}
