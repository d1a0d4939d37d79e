//! Prometheus metrics exposition.
//!
//! The recorder installs once per process into a global handle; the
//! `/metrics` route renders from it. When the recorder is disabled the
//! route stays up and serves a comment line, so scrapes never 404.

use axum::routing::get;
use axum::Router;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub enable: bool,
}

/// Installs the Prometheus recorder when enabled. Later calls no-op.
pub fn init(config: &Config) {
    if !config.enable || HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
            describe_metrics();
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to install metrics recorder");
        }
    }
}

/// Registers help texts for everything the engine emits.
pub fn describe_metrics() {
    describe_counter!(
        "driftforge_documents_ingested_total",
        "Documents accepted through the ingest path"
    );
    describe_counter!(
        "driftforge_schema_versions_total",
        "Schema versions cut across all sources"
    );
    describe_counter!(
        "driftforge_diff_requests_total",
        "Version diffs served"
    );
    describe_counter!(
        "driftforge_ingest_failures_total",
        "Ingest requests that failed"
    );
    describe_counter!(
        "driftforge_panics_total",
        "Panics captured by the global hook"
    );
    describe_gauge!(
        "driftforge_known_sources",
        "Distinct sources with at least one registered schema"
    );
    describe_histogram!(
        "driftforge_ingest_duration_seconds",
        "Wall time of one ingest operation"
    );
}

async fn metrics_handler() -> String {
    match HANDLE.get() {
        Some(handle) => handle.render(),
        None => "# metrics recorder not installed\n".to_string(),
    }
}

/// A router serving `GET /metrics`, ready to merge or bind standalone.
pub fn router_with_metrics() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}
