//! SQLite-backed persistent store.
//!
//! Schema histories and raw documents live in two tables keyed by
//! `(source, version)`. All statements run on the blocking pool through
//! the `db!` macro; the connection itself sits behind a mutex, so every
//! operation is serialized and the per-source atomicity the registry
//! promises holds trivially. Descriptors and payloads are stored as JSON
//! text.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use driftforge_core::{
    DocumentStore, EngineError, EngineResult, RawDocument, SchemaRecord,
    SchemaRegistry,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use schema_shape::{merge, Descriptor};
use serde_json::Value;
use uuid::Uuid;

const INIT_SQL: &str = "
PRAGMA journal_mode=WAL;
PRAGMA synchronous=NORMAL;
PRAGMA busy_timeout=5000;
PRAGMA foreign_keys=ON;

CREATE TABLE IF NOT EXISTS schema_versions (
    source      TEXT    NOT NULL,
    version     INTEGER NOT NULL,
    descriptor  TEXT    NOT NULL,
    fingerprint TEXT    NOT NULL,
    created_at  TEXT    NOT NULL,
    PRIMARY KEY (source, version)
);

CREATE TABLE IF NOT EXISTS raw_documents (
    id             TEXT    PRIMARY KEY,
    source         TEXT    NOT NULL,
    schema_version INTEGER NOT NULL,
    payload        TEXT    NOT NULL,
    ingested_at    TEXT    NOT NULL,
    FOREIGN KEY (source, schema_version)
        REFERENCES schema_versions (source, version)
);

CREATE INDEX IF NOT EXISTS idx_raw_documents_source
    ON raw_documents (source, schema_version);
";

const SCHEMA_COLUMNS: &str =
    "source, version, descriptor, fingerprint, created_at";
const DOCUMENT_COLUMNS: &str =
    "id, source, schema_version, payload, ingested_at";

/// Runs `$body` against the pooled connection on the blocking pool.
macro_rules! db {
    ($conn:expr, $body:expr) => {{
        let conn = Arc::clone(&$conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap();
            ($body)(&*guard)
        })
        .await
        .map_err(|e| EngineError::Storage {
            details: format!("spawn_blocking panic: {e}").into(),
        })?
    }};
}

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`.
    pub fn new(path: impl AsRef<Path>) -> EngineResult<Self> {
        let conn = Connection::open(path).map_err(storage_err)?;
        Self::init(conn)
    }

    /// Volatile database for tests.
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> EngineResult<Self> {
        conn.execute_batch(INIT_SQL).map_err(storage_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl SchemaRegistry for SqliteStore {
    async fn register_if_new(
        &self,
        source: &str,
        descriptor: Descriptor,
    ) -> EngineResult<(SchemaRecord, bool)> {
        let source = source.to_string();
        db!(self.conn, move |conn: &Connection| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;

            let latest = tx
                .query_row(
                    &format!(
                        "SELECT {SCHEMA_COLUMNS} FROM schema_versions
                         WHERE source = ?1
                         ORDER BY version DESC LIMIT 1"
                    ),
                    params![source],
                    schema_row,
                )
                .optional()
                .map_err(storage_err)?;

            let (version, candidate) = match latest {
                Some(latest) => {
                    let merged =
                        merge(latest.descriptor.clone(), descriptor);
                    if merged == latest.descriptor {
                        return Ok((latest, false));
                    }
                    (latest.version + 1, merged)
                }
                None => (1, descriptor),
            };

            let record = SchemaRecord::new(&source, version, candidate);
            let descriptor_json = serde_json::to_string(&record.descriptor)
                .map_err(|e| EngineError::Storage {
                    details: format!("serialize descriptor: {e}").into(),
                })?;
            tx.execute(
                &format!(
                    "INSERT INTO schema_versions ({SCHEMA_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5)"
                ),
                params![
                    record.source,
                    record.version,
                    descriptor_json,
                    record.fingerprint,
                    record.created_at.to_rfc3339(),
                ],
            )
            .map_err(storage_err)?;
            tx.commit().map_err(storage_err)?;

            Ok((record, true))
        })
    }

    async fn latest(&self, source: &str) -> EngineResult<Option<SchemaRecord>> {
        let source = source.to_string();
        db!(self.conn, move |conn: &Connection| {
            conn.query_row(
                &format!(
                    "SELECT {SCHEMA_COLUMNS} FROM schema_versions
                     WHERE source = ?1
                     ORDER BY version DESC LIMIT 1"
                ),
                params![source],
                schema_row,
            )
            .optional()
            .map_err(storage_err)
        })
    }

    async fn get_version(
        &self,
        source: &str,
        version: u32,
    ) -> EngineResult<SchemaRecord> {
        let source = source.to_string();
        db!(self.conn, move |conn: &Connection| {
            conn.query_row(
                &format!(
                    "SELECT {SCHEMA_COLUMNS} FROM schema_versions
                     WHERE source = ?1 AND version = ?2"
                ),
                params![source, version],
                schema_row,
            )
            .optional()
            .map_err(storage_err)?
            .ok_or_else(|| EngineError::NotFound {
                details: format!(
                    "source {source} has no schema version {version}"
                )
                .into(),
            })
        })
    }

    async fn list_schemas(
        &self,
        source: Option<&str>,
    ) -> EngineResult<Vec<SchemaRecord>> {
        let source = source.map(str::to_string);
        db!(self.conn, move |conn: &Connection| {
            let mut records = Vec::new();
            match source {
                Some(source) => {
                    let mut stmt = conn
                        .prepare(&format!(
                            "SELECT {SCHEMA_COLUMNS} FROM schema_versions
                             WHERE source = ?1
                             ORDER BY version ASC"
                        ))
                        .map_err(storage_err)?;
                    let rows = stmt
                        .query_map(params![source], schema_row)
                        .map_err(storage_err)?;
                    for row in rows {
                        records.push(row.map_err(storage_err)?);
                    }
                }
                None => {
                    let mut stmt = conn
                        .prepare(&format!(
                            "SELECT {SCHEMA_COLUMNS} FROM schema_versions
                             ORDER BY source ASC, version ASC"
                        ))
                        .map_err(storage_err)?;
                    let rows = stmt
                        .query_map([], schema_row)
                        .map_err(storage_err)?;
                    for row in rows {
                        records.push(row.map_err(storage_err)?);
                    }
                }
            }
            Ok(records)
        })
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn put(
        &self,
        source: &str,
        schema_version: u32,
        payload: Value,
    ) -> EngineResult<RawDocument> {
        let document = RawDocument::new(source, schema_version, payload);
        db!(self.conn, move |conn: &Connection| {
            let tx = conn.unchecked_transaction().map_err(storage_err)?;

            let known: Option<u32> = tx
                .query_row(
                    "SELECT version FROM schema_versions
                     WHERE source = ?1 AND version = ?2",
                    params![document.source, document.schema_version],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage_err)?;
            if known.is_none() {
                return Err(EngineError::InvalidReference {
                    details: format!(
                        "source {} has no schema version {}",
                        document.source, document.schema_version
                    )
                    .into(),
                });
            }

            let payload_json = serde_json::to_string(&document.payload)
                .map_err(|e| EngineError::Storage {
                    details: format!("serialize payload: {e}").into(),
                })?;
            tx.execute(
                &format!(
                    "INSERT INTO raw_documents ({DOCUMENT_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5)"
                ),
                params![
                    document.id.to_string(),
                    document.source,
                    document.schema_version,
                    payload_json,
                    document.ingested_at.to_rfc3339(),
                ],
            )
            .map_err(storage_err)?;
            tx.commit().map_err(storage_err)?;

            Ok(document)
        })
    }

    async fn list(
        &self,
        source: &str,
        schema_version: Option<u32>,
        limit: Option<usize>,
    ) -> EngineResult<Vec<RawDocument>> {
        let source = source.to_string();
        // SQLite treats a negative LIMIT as "no limit".
        let cap = limit.map_or(-1, |n| n as i64);
        db!(self.conn, move |conn: &Connection| {
            let mut documents = Vec::new();
            match schema_version {
                Some(version) => {
                    let mut stmt = conn
                        .prepare(&format!(
                            "SELECT {DOCUMENT_COLUMNS} FROM raw_documents
                             WHERE source = ?1 AND schema_version = ?2
                             ORDER BY rowid DESC LIMIT ?3"
                        ))
                        .map_err(storage_err)?;
                    let rows = stmt
                        .query_map(params![source, version, cap], document_row)
                        .map_err(storage_err)?;
                    for row in rows {
                        documents.push(row.map_err(storage_err)?);
                    }
                }
                None => {
                    let mut stmt = conn
                        .prepare(&format!(
                            "SELECT {DOCUMENT_COLUMNS} FROM raw_documents
                             WHERE source = ?1
                             ORDER BY rowid DESC LIMIT ?2"
                        ))
                        .map_err(storage_err)?;
                    let rows = stmt
                        .query_map(params![source, cap], document_row)
                        .map_err(storage_err)?;
                    for row in rows {
                        documents.push(row.map_err(storage_err)?);
                    }
                }
            }
            Ok(documents)
        })
    }
}

fn storage_err(err: rusqlite::Error) -> EngineError {
    EngineError::Storage {
        details: err.to_string().into(),
    }
}

fn schema_row(row: &Row<'_>) -> rusqlite::Result<SchemaRecord> {
    let descriptor: String = row.get(2)?;
    let descriptor = serde_json::from_str(&descriptor).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;
    let created_at: String = row.get(4)?;
    Ok(SchemaRecord {
        source: row.get(0)?,
        version: row.get(1)?,
        descriptor,
        fingerprint: row.get(3)?,
        created_at: parse_timestamp(&created_at),
    })
}

fn document_row(row: &Row<'_>) -> rusqlite::Result<RawDocument> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;
    let payload: String = row.get(3)?;
    let payload: Value = serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;
    let ingested_at: String = row.get(4)?;
    Ok(RawDocument {
        id,
        source: row.get(1)?,
        schema_version: row.get(2)?,
        payload,
        ingested_at: parse_timestamp(&ingested_at),
    })
}

/// Timestamps are stored as RFC 3339 text; unparsable values fall back to
/// now rather than poisoning reads.
fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
