//! In-memory backend. Fast, non-durable, the default for tests and for
//! running without a configured database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use driftforge_core::{
    DocumentStore, EngineError, EngineResult, RawDocument, SchemaRecord,
    SchemaRegistry,
};
use parking_lot::{Mutex, RwLock};
use schema_shape::{merge, Descriptor};
use serde_json::Value;

type History = Arc<Mutex<Vec<SchemaRecord>>>;

/// Process-local store for schema histories and raw documents.
///
/// Each source's history sits behind its own mutex, so ingestion for one
/// source serializes only against itself; the outer map lock is held just
/// long enough to find or create the entry. No lock is held across an
/// await point.
#[derive(Default)]
pub struct MemoryStore {
    schemas: RwLock<HashMap<String, History>>,
    documents: RwLock<Vec<RawDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds or creates the history slot for `source`.
    fn history(&self, source: &str) -> History {
        if let Some(history) = self.schemas.read().get(source) {
            return Arc::clone(history);
        }
        let mut map = self.schemas.write();
        Arc::clone(map.entry(source.to_string()).or_default())
    }

    /// Read-only lookup that never creates an entry.
    fn existing_history(&self, source: &str) -> Option<History> {
        self.schemas.read().get(source).map(Arc::clone)
    }
}

#[async_trait]
impl SchemaRegistry for MemoryStore {
    async fn register_if_new(
        &self,
        source: &str,
        descriptor: Descriptor,
    ) -> EngineResult<(SchemaRecord, bool)> {
        let history = self.history(source);
        let mut history = history.lock();

        let candidate = match history.last() {
            Some(latest) => {
                let merged = merge(latest.descriptor.clone(), descriptor);
                if merged == latest.descriptor {
                    return Ok((latest.clone(), false));
                }
                merged
            }
            None => descriptor,
        };

        let version = history.len() as u32 + 1;
        let record = SchemaRecord::new(source, version, candidate);
        history.push(record.clone());
        Ok((record, true))
    }

    async fn latest(&self, source: &str) -> EngineResult<Option<SchemaRecord>> {
        Ok(self
            .existing_history(source)
            .and_then(|history| history.lock().last().cloned()))
    }

    async fn get_version(
        &self,
        source: &str,
        version: u32,
    ) -> EngineResult<SchemaRecord> {
        self.existing_history(source)
            .and_then(|history| {
                history
                    .lock()
                    .iter()
                    .find(|record| record.version == version)
                    .cloned()
            })
            .ok_or_else(|| EngineError::NotFound {
                details: format!(
                    "source {source} has no schema version {version}"
                )
                .into(),
            })
    }

    async fn list_schemas(
        &self,
        source: Option<&str>,
    ) -> EngineResult<Vec<SchemaRecord>> {
        match source {
            Some(source) => Ok(self
                .existing_history(source)
                .map(|history| history.lock().clone())
                .unwrap_or_default()),
            None => {
                let mut histories: Vec<(String, History)> = {
                    let map = self.schemas.read();
                    map.iter()
                        .map(|(name, history)| {
                            (name.clone(), Arc::clone(history))
                        })
                        .collect()
                };
                histories.sort_by(|a, b| a.0.cmp(&b.0));

                let mut records = Vec::new();
                for (_, history) in histories {
                    records.extend(history.lock().iter().cloned());
                }
                Ok(records)
            }
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(
        &self,
        source: &str,
        schema_version: u32,
        payload: Value,
    ) -> EngineResult<RawDocument> {
        // Versions are contiguous from 1, so existence is a length check.
        // Histories only grow, which keeps this safe against a racing
        // registration between the check and the push below.
        let known = self
            .existing_history(source)
            .map(|history| {
                let history = history.lock();
                schema_version >= 1
                    && (schema_version as usize) <= history.len()
            })
            .unwrap_or(false);
        if !known {
            return Err(EngineError::InvalidReference {
                details: format!(
                    "source {source} has no schema version {schema_version}"
                )
                .into(),
            });
        }

        let document = RawDocument::new(source, schema_version, payload);
        self.documents.write().push(document.clone());
        Ok(document)
    }

    async fn list(
        &self,
        source: &str,
        schema_version: Option<u32>,
        limit: Option<usize>,
    ) -> EngineResult<Vec<RawDocument>> {
        let documents = self.documents.read();
        Ok(documents
            .iter()
            .rev()
            .filter(|doc| doc.source == source)
            .filter(|doc| {
                schema_version.is_none_or(|v| doc.schema_version == v)
            })
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schema_shape::infer;
    use serde_json::json;

    #[tokio::test]
    async fn test_first_registration_stores_raw_descriptor() {
        let store = MemoryStore::new();
        let shape = infer(&json!({"driver": "VER"}));

        let (record, created) = store
            .register_if_new("telemetry", shape.clone())
            .await
            .unwrap();

        assert!(created);
        assert_eq!(record.version, 1);
        assert_eq!(record.descriptor, shape);
    }

    #[tokio::test]
    async fn test_known_shape_is_a_noop() {
        let store = MemoryStore::new();
        let shape = infer(&json!({"driver": "VER", "lap": 1}));

        let (first, _) = store
            .register_if_new("telemetry", shape.clone())
            .await
            .unwrap();
        let (second, created) = store
            .register_if_new("telemetry", shape)
            .await
            .unwrap();

        assert!(!created);
        assert_eq!(second.version, 1);
        assert_eq!(second.fingerprint, first.fingerprint);
    }

    #[tokio::test]
    async fn test_new_shape_appends_merged_descriptor() {
        let store = MemoryStore::new();
        let v1_shape = infer(&json!({"driver": "VER"}));
        let v2_shape = infer(&json!({"driver": "VER", "lap": 1}));

        store
            .register_if_new("telemetry", v1_shape.clone())
            .await
            .unwrap();
        let (record, created) = store
            .register_if_new("telemetry", v2_shape.clone())
            .await
            .unwrap();

        assert!(created);
        assert_eq!(record.version, 2);
        // The stored descriptor is the widened shape, not the raw input.
        assert_eq!(record.descriptor, merge(v1_shape, v2_shape));
    }

    #[tokio::test]
    async fn test_unknown_source_reads() {
        let store = MemoryStore::new();

        assert!(store.latest("ghost").await.unwrap().is_none());
        assert!(store.list_schemas(Some("ghost")).await.unwrap().is_empty());
        let err = store.get_version("ghost", 1).await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_reads_do_not_create_history_entries() {
        let store = MemoryStore::new();
        let _ = store.latest("ghost").await.unwrap();
        let _ = store.list("ghost", None, None).await.unwrap();

        assert!(store.schemas.read().is_empty());
    }

    #[tokio::test]
    async fn test_put_rejects_unregistered_version() {
        let store = MemoryStore::new();
        store
            .register_if_new("telemetry", infer(&json!({"a": 1})))
            .await
            .unwrap();

        let err = store
            .put("telemetry", 2, json!({"a": 1}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_reference");

        let err = store.put("ghost", 1, json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_reference");
    }

    #[tokio::test]
    async fn test_list_documents_most_recent_first() {
        let store = MemoryStore::new();
        store
            .register_if_new("telemetry", infer(&json!({"lap": 1})))
            .await
            .unwrap();

        for lap in 1..=5 {
            store
                .put("telemetry", 1, json!({"lap": lap}))
                .await
                .unwrap();
        }

        let docs = store.list("telemetry", None, None).await.unwrap();
        assert_eq!(docs.len(), 5);
        assert_eq!(docs[0].payload, json!({"lap": 5}));
        assert_eq!(docs[4].payload, json!({"lap": 1}));

        let capped = store.list("telemetry", None, Some(2)).await.unwrap();
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[0].payload, json!({"lap": 5}));
    }

    #[tokio::test]
    async fn test_list_documents_filters_by_version() {
        let store = MemoryStore::new();
        store
            .register_if_new("telemetry", infer(&json!({"lap": 1})))
            .await
            .unwrap();
        store
            .register_if_new("telemetry", infer(&json!({"lap": 1, "pit": true})))
            .await
            .unwrap();

        store.put("telemetry", 1, json!({"lap": 1})).await.unwrap();
        store
            .put("telemetry", 2, json!({"lap": 2, "pit": false}))
            .await
            .unwrap();

        let v1_docs = store
            .list("telemetry", Some(1), None)
            .await
            .unwrap();
        assert_eq!(v1_docs.len(), 1);
        assert_eq!(v1_docs[0].schema_version, 1);
    }
}
