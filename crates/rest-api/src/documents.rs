//! Raw document surface: ingestion and retrieval.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use driftforge_core::{EngineError, EngineResult};
use schema_shape::parse_schema_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{engine_error, ApiError, ApiResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub source: String,
    pub payload: Value,
}

/// What the caller gets back for one accepted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub document_id: Uuid,
    pub source: String,
    pub schema_version: u32,
    pub schema_id: String,
    /// True when this document cut a new schema version.
    pub new_version: bool,
    pub ingested_at: DateTime<Utc>,
}

/// One stored document in list views, with its version resolved to a
/// full schema id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocumentInfo {
    pub id: Uuid,
    pub source: String,
    pub schema_version: u32,
    pub schema_id: String,
    pub ingested_at: DateTime<Utc>,
    pub payload: Value,
}

/// Write and read operations the document routes delegate to.
#[async_trait]
pub trait DocumentOps: Send + Sync {
    async fn ingest(
        &self,
        source: String,
        payload: Value,
    ) -> EngineResult<IngestReceipt>;
    async fn list(
        &self,
        source: &str,
        schema_version: Option<u32>,
        limit: Option<usize>,
    ) -> EngineResult<Vec<RawDocumentInfo>>;
}

#[derive(Clone)]
pub struct DocumentState {
    pub documents: Arc<dyn DocumentOps>,
}

pub fn router(state: DocumentState) -> Router {
    Router::new()
        .route("/ingest", post(ingest))
        .route("/raw", get(list_raw))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RawQuery {
    source: String,
    schema_version: Option<u32>,
    schema_id: Option<String>,
    limit: Option<usize>,
}

async fn ingest(
    State(state): State<DocumentState>,
    Json(request): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestReceipt>), ApiError> {
    state
        .documents
        .ingest(request.source, request.payload)
        .await
        .map(|receipt| (StatusCode::CREATED, Json(receipt)))
        .map_err(engine_error)
}

async fn list_raw(
    State(state): State<DocumentState>,
    Query(query): Query<RawQuery>,
) -> ApiResult<Vec<RawDocumentInfo>> {
    // A schema id pins both source and version and takes precedence
    // over a bare schema_version parameter.
    let version = match &query.schema_id {
        Some(id) => {
            let (source, version) = parse_schema_id(id).ok_or_else(|| {
                engine_error(EngineError::MalformedInput {
                    details: format!("unparsable schema id: {id}").into(),
                })
            })?;
            if source != query.source {
                return Err(engine_error(EngineError::MalformedInput {
                    details: format!(
                        "schema id {id} does not belong to source {}",
                        query.source
                    )
                    .into(),
                }));
            }
            Some(version)
        }
        None => query.schema_version,
    };

    state
        .documents
        .list(&query.source, version, query.limit)
        .await
        .map(Json)
        .map_err(engine_error)
}
