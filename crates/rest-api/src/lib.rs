//! HTTP surface for the schema drift engine.
//!
//! Routes are grouped per concern and merged into one [`Router`]:
//!
//! - `POST /ingest`, `GET /raw` for raw documents,
//! - `GET /schemas`, `GET /schemas/{source}/{version}`,
//!   `GET /schemas/{source}/latest`, `GET /schema/diff` for the registry,
//! - `GET /healthz`, `GET /readyz` probes.
//!
//! Handlers stay thin: they parse the request, call a controller trait
//! ([`SchemaQueries`] or [`DocumentOps`]) and map [`EngineError`] onto a
//! status code plus a small JSON error body. The traits keep the crate
//! testable without a running engine behind it.
//!
//! [`EngineError`]: driftforge_core::EngineError

mod documents;
mod errors;
mod health;
mod schemas;

pub use documents::{
    DocumentOps, DocumentState, IngestReceipt, IngestRequest, RawDocumentInfo,
};
pub use errors::{engine_error, ApiError, ErrorBody};
pub use health::{ReadyStatus, SourceStatus};
pub use schemas::{SchemaDetail, SchemaInfo, SchemaQueries, SchemaState};

use axum::Router;

/// Build the full API router from the two controller states.
pub fn router(
    schema_state: SchemaState,
    document_state: DocumentState,
) -> Router {
    health::router(schema_state.clone())
        .merge(schemas::router(schema_state))
        .merge(documents::router(document_state))
}
