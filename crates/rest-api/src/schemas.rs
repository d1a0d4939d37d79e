//! Schema read surface: listing, retrieval and version diffing.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use driftforge_core::{DiffReport, EngineResult};
use schema_shape::{Descriptor, DescriptorSummary};
use serde::{Deserialize, Serialize};

use crate::errors::{engine_error, ApiResult};

/// Compact version entry for list views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub source: String,
    pub version: u32,
    pub schema_id: String,
    /// Short-form fingerprint.
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub descriptor_summary: DescriptorSummary,
}

/// Full record for single-version views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDetail {
    pub source: String,
    pub version: u32,
    pub schema_id: String,
    /// Full fingerprint.
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub descriptor: Descriptor,
}

/// Read operations the schema routes delegate to.
#[async_trait]
pub trait SchemaQueries: Send + Sync {
    async fn list(
        &self,
        source: Option<String>,
    ) -> EngineResult<Vec<SchemaInfo>>;
    async fn get(
        &self,
        source: &str,
        version: u32,
    ) -> EngineResult<SchemaDetail>;
    async fn latest(&self, source: &str) -> EngineResult<SchemaDetail>;
    async fn diff(
        &self,
        source: &str,
        v1: u32,
        v2: u32,
    ) -> EngineResult<DiffReport>;
}

#[derive(Clone)]
pub struct SchemaState {
    pub queries: Arc<dyn SchemaQueries>,
}

pub fn router(state: SchemaState) -> Router {
    Router::new()
        .route("/schemas", get(list_schemas))
        .route("/schemas/{source}/latest", get(latest_schema))
        .route("/schemas/{source}/{version}", get(get_schema))
        .route("/schema/diff", get(diff_schemas))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiffQuery {
    source: String,
    v1: u32,
    v2: u32,
}

async fn list_schemas(
    State(state): State<SchemaState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<SchemaInfo>> {
    state
        .queries
        .list(query.source)
        .await
        .map(Json)
        .map_err(engine_error)
}

async fn get_schema(
    State(state): State<SchemaState>,
    Path((source, version)): Path<(String, u32)>,
) -> ApiResult<SchemaDetail> {
    state
        .queries
        .get(&source, version)
        .await
        .map(Json)
        .map_err(engine_error)
}

async fn latest_schema(
    State(state): State<SchemaState>,
    Path(source): Path<String>,
) -> ApiResult<SchemaDetail> {
    state
        .queries
        .latest(&source)
        .await
        .map(Json)
        .map_err(engine_error)
}

async fn diff_schemas(
    State(state): State<SchemaState>,
    Query(query): Query<DiffQuery>,
) -> ApiResult<DiffReport> {
    state
        .queries
        .diff(&query.source, query.v1, query.v2)
        .await
        .map(Json)
        .map_err(engine_error)
}
