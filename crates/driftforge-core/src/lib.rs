//! Core domain model of the schema drift engine.
//!
//! This crate defines the records the engine persists, the traits its
//! storage backends implement, and the [`Ingestor`] that ties inference,
//! registration and raw-document storage together. Backends live in
//! `driftforge-store`; HTTP lives in `rest-api`. Neither leaks in here.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schema_shape::{
    compute_fingerprint, infer_with_depth, Descriptor, Diff, DEFAULT_MAX_DEPTH,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub mod errors;

pub use errors::{EngineError, EngineResult};

// ==========================================================================
// Records
// ==========================================================================

/// One immutable version in a source's schema history.
///
/// Versions start at 1 and grow without gaps. A record never changes once
/// written; evolution always appends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub source: String,
    pub version: u32,
    pub descriptor: Descriptor,
    /// Full hex fingerprint of `descriptor`.
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

impl SchemaRecord {
    pub fn new(
        source: impl Into<String>,
        version: u32,
        descriptor: Descriptor,
    ) -> Self {
        let fingerprint = compute_fingerprint(&descriptor);
        Self {
            source: source.into(),
            version,
            descriptor,
            fingerprint,
            created_at: Utc::now(),
        }
    }

    /// Stable identifier of this version, `{source}-v{version}-{fp8}`.
    pub fn schema_id(&self) -> String {
        schema_shape::schema_id(&self.source, self.version, &self.fingerprint)
    }
}

/// A raw document exactly as ingested, tagged with the schema version it
/// matched at ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: Uuid,
    pub source: String,
    pub schema_version: u32,
    pub payload: Value,
    pub ingested_at: DateTime<Utc>,
}

impl RawDocument {
    pub fn new(
        source: impl Into<String>,
        schema_version: u32,
        payload: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            schema_version,
            payload,
            ingested_at: Utc::now(),
        }
    }
}

/// A field-level comparison between two registered versions of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffReport {
    pub source: String,
    pub v1: u32,
    pub v2: u32,
    #[serde(flatten)]
    pub changes: Diff,
}

// ==========================================================================
// Storage traits
// ==========================================================================

/// Append-only, versioned schema history per source.
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    /// Registers `descriptor` for `source` unless the latest version
    /// already subsumes it.
    ///
    /// Returns the governing record and whether it was created by this
    /// call. When a new version is cut, its descriptor is the merge of
    /// the previous latest with the incoming shape, so history widens
    /// monotonically. The check-and-append is atomic per source: under
    /// concurrent ingestion every caller observes the same winner.
    async fn register_if_new(
        &self,
        source: &str,
        descriptor: Descriptor,
    ) -> EngineResult<(SchemaRecord, bool)>;

    /// Latest version for `source`, or `None` for an unknown source.
    async fn latest(&self, source: &str) -> EngineResult<Option<SchemaRecord>>;

    /// A specific version, erring with [`EngineError::NotFound`] when
    /// either the source or the version does not exist.
    async fn get_version(
        &self,
        source: &str,
        version: u32,
    ) -> EngineResult<SchemaRecord>;

    /// Every registered version, ordered by `(source, version)`, optionally
    /// restricted to one source. An unknown source yields an empty list.
    async fn list_schemas(
        &self,
        source: Option<&str>,
    ) -> EngineResult<Vec<SchemaRecord>>;
}

/// Raw document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores `payload` under `source`, tagged with `schema_version`.
    ///
    /// The version must already exist in the registry; otherwise the
    /// store refuses with [`EngineError::InvalidReference`].
    async fn put(
        &self,
        source: &str,
        schema_version: u32,
        payload: Value,
    ) -> EngineResult<RawDocument>;

    /// Documents for `source`, most recent first, optionally filtered to
    /// one schema version and capped at `limit`.
    async fn list(
        &self,
        source: &str,
        schema_version: Option<u32>,
        limit: Option<usize>,
    ) -> EngineResult<Vec<RawDocument>>;
}

// ==========================================================================
// Operations
// ==========================================================================

/// Diffs two registered versions of one source.
///
/// Both versions must exist. `v1 == v2` is valid and yields an empty
/// change set.
pub async fn diff_versions(
    registry: &dyn SchemaRegistry,
    source: &str,
    v1: u32,
    v2: u32,
) -> EngineResult<DiffReport> {
    let from = registry.get_version(source, v1).await?;
    let to = registry.get_version(source, v2).await?;
    Ok(DiffReport {
        source: source.to_string(),
        v1,
        v2,
        changes: schema_shape::diff(&from.descriptor, &to.descriptor),
    })
}

/// The write path: infer, register, store.
///
/// One `Ingestor` is shared across the whole process; it holds no state
/// of its own beyond handles to the registry and the document store.
pub struct Ingestor {
    registry: Arc<dyn SchemaRegistry>,
    store: Arc<dyn DocumentStore>,
    max_depth: usize,
}

/// What one successful ingestion produced.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub document: RawDocument,
    pub schema: SchemaRecord,
    /// True when this document cut a new schema version.
    pub new_version: bool,
}

impl Ingestor {
    pub fn new(
        registry: Arc<dyn SchemaRegistry>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            registry,
            store,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Overrides the inference nesting cutoff.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Ingests one document for `source`.
    ///
    /// Registration settles before the document is written, so a stored
    /// document always references an existing version. If storage fails
    /// afterwards the version stays registered; re-ingesting the same
    /// document is then a no-op on the registry side.
    pub async fn ingest(
        &self,
        source: &str,
        payload: Value,
    ) -> EngineResult<IngestOutcome> {
        if source.is_empty() {
            return Err(EngineError::MalformedInput {
                details: "source name must not be empty".into(),
            });
        }

        let descriptor = infer_with_depth(&payload, self.max_depth);
        let (schema, new_version) =
            self.registry.register_if_new(source, descriptor).await?;
        let document =
            self.store.put(source, schema.version, payload).await?;

        Ok(IngestOutcome {
            document,
            schema,
            new_version,
        })
    }
}

// ==========================================================================
// Tests
// ==========================================================================
