//! Liveness and readiness probes.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::errors::{engine_error, ApiResult};
use crate::schemas::SchemaState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyStatus {
    pub status: String,
    pub sources: Vec<SourceStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source: String,
    pub versions: u32,
}

pub fn router(state: SchemaState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Ready once the registry answers; the body doubles as a cheap
/// inventory of tracked sources.
async fn readyz(State(state): State<SchemaState>) -> ApiResult<ReadyStatus> {
    let schemas = state.queries.list(None).await.map_err(engine_error)?;

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for schema in schemas {
        let latest = counts.entry(schema.source).or_default();
        *latest = (*latest).max(schema.version);
    }

    Ok(Json(ReadyStatus {
        status: "ready".into(),
        sources: counts
            .into_iter()
            .map(|(source, versions)| SourceStatus { source, versions })
            .collect(),
    }))
}
