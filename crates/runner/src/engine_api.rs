//! Engine API - wires the registry and document store behind the REST
//! controller traits.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use driftforge_core::{
    diff_versions, DiffReport, DocumentStore, EngineError, EngineResult,
    IngestOutcome, Ingestor, SchemaRecord, SchemaRegistry,
};
use metrics::{counter, gauge, histogram};
use rest_api::{
    DocumentOps, IngestReceipt, RawDocumentInfo, SchemaDetail, SchemaInfo,
    SchemaQueries,
};
use schema_shape::summarize;
use serde_json::Value;

#[derive(Clone)]
pub struct EngineApi {
    registry: Arc<dyn SchemaRegistry>,
    store: Arc<dyn DocumentStore>,
    ingestor: Arc<Ingestor>,
}

impl EngineApi {
    pub fn new(
        registry: Arc<dyn SchemaRegistry>,
        store: Arc<dyn DocumentStore>,
        ingestor: Arc<Ingestor>,
    ) -> Self {
        Self {
            registry,
            store,
            ingestor,
        }
    }
}

fn schema_info(record: SchemaRecord) -> SchemaInfo {
    SchemaInfo {
        schema_id: record.schema_id(),
        fingerprint: record.fingerprint.chars().take(16).collect(),
        descriptor_summary: summarize(&record.descriptor),
        source: record.source,
        version: record.version,
        created_at: record.created_at,
    }
}

fn schema_detail(record: SchemaRecord) -> SchemaDetail {
    SchemaDetail {
        schema_id: record.schema_id(),
        source: record.source,
        version: record.version,
        fingerprint: record.fingerprint,
        created_at: record.created_at,
        descriptor: record.descriptor,
    }
}

fn receipt(outcome: IngestOutcome) -> IngestReceipt {
    IngestReceipt {
        document_id: outcome.document.id,
        schema_id: outcome.schema.schema_id(),
        source: outcome.document.source,
        schema_version: outcome.schema.version,
        new_version: outcome.new_version,
        ingested_at: outcome.document.ingested_at,
    }
}

#[async_trait]
impl SchemaQueries for EngineApi {
    async fn list(
        &self,
        source: Option<String>,
    ) -> EngineResult<Vec<SchemaInfo>> {
        let records = self.registry.list_schemas(source.as_deref()).await?;
        Ok(records.into_iter().map(schema_info).collect())
    }

    async fn get(
        &self,
        source: &str,
        version: u32,
    ) -> EngineResult<SchemaDetail> {
        let record = self.registry.get_version(source, version).await?;
        Ok(schema_detail(record))
    }

    async fn latest(&self, source: &str) -> EngineResult<SchemaDetail> {
        let record = self.registry.latest(source).await?.ok_or_else(|| {
            EngineError::NotFound {
                details: format!("no schemas for source {source}").into(),
            }
        })?;
        Ok(schema_detail(record))
    }

    async fn diff(
        &self,
        source: &str,
        v1: u32,
        v2: u32,
    ) -> EngineResult<DiffReport> {
        counter!("driftforge_diff_requests_total").increment(1);
        diff_versions(self.registry.as_ref(), source, v1, v2).await
    }
}

#[async_trait]
impl DocumentOps for EngineApi {
    async fn ingest(
        &self,
        source: String,
        payload: Value,
    ) -> EngineResult<IngestReceipt> {
        let t0 = Instant::now();
        let outcome = match self.ingestor.ingest(&source, payload).await {
            Ok(outcome) => outcome,
            Err(e) => {
                counter!("driftforge_ingest_failures_total").increment(1);
                return Err(e);
            }
        };

        counter!("driftforge_documents_ingested_total").increment(1);
        if outcome.new_version {
            counter!("driftforge_schema_versions_total").increment(1);
            if outcome.schema.version == 1 {
                gauge!("driftforge_known_sources").increment(1.0);
            }
        }
        histogram!("driftforge_ingest_duration_seconds")
            .record(t0.elapsed().as_secs_f64());

        Ok(receipt(outcome))
    }

    async fn list(
        &self,
        source: &str,
        schema_version: Option<u32>,
        limit: Option<usize>,
    ) -> EngineResult<Vec<RawDocumentInfo>> {
        let documents =
            self.store.list(source, schema_version, limit).await?;
        let ids: HashMap<u32, String> = self
            .registry
            .list_schemas(Some(source))
            .await?
            .into_iter()
            .map(|record| (record.version, record.schema_id()))
            .collect();

        documents
            .into_iter()
            .map(|doc| {
                let schema_id = ids
                    .get(&doc.schema_version)
                    .cloned()
                    .ok_or_else(|| EngineError::Storage {
                        details: format!(
                            "document {} references unregistered version \
                             {} of {}",
                            doc.id, doc.schema_version, doc.source
                        )
                        .into(),
                    })?;
                Ok(RawDocumentInfo {
                    id: doc.id,
                    source: doc.source,
                    schema_version: doc.schema_version,
                    schema_id,
                    ingested_at: doc.ingested_at,
                    payload: doc.payload,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftforge_store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn engine() -> EngineApi {
        let store = Arc::new(MemoryStore::new());
        let registry: Arc<dyn SchemaRegistry> = store.clone();
        let documents: Arc<dyn DocumentStore> = store;
        let ingestor =
            Arc::new(Ingestor::new(registry.clone(), documents.clone()));
        EngineApi::new(registry, documents, ingestor)
    }

    #[tokio::test]
    async fn test_ingest_receipt_carries_registry_outcome() {
        let api = engine();

        let first = api
            .ingest("telemetry".into(), json!({"driver": "VER", "lap": 1}))
            .await
            .unwrap();
        let second = api
            .ingest("telemetry".into(), json!({"driver": "PIA", "lap": 2}))
            .await
            .unwrap();

        assert!(first.new_version);
        assert!(!second.new_version);
        assert_eq!(second.schema_version, 1);
        assert!(second.schema_id.starts_with("telemetry-v1-"));
    }

    #[tokio::test]
    async fn test_list_summarizes_and_shortens_fingerprints() {
        let api = engine();
        api.ingest("telemetry".into(), json!({"driver": "VER", "lap": 1}))
            .await
            .unwrap();

        let infos = SchemaQueries::list(&api, None).await.unwrap();

        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].fingerprint.len(), 16);
        assert_eq!(
            infos[0].descriptor_summary.kind,
            schema_shape::Kind::Object
        );
        assert_eq!(
            infos[0].descriptor_summary.field_names,
            vec!["driver".to_string(), "lap".to_string()]
        );

        let detail = api.latest("telemetry").await.unwrap();
        assert!(detail.fingerprint.starts_with(&infos[0].fingerprint));
        assert_eq!(detail.fingerprint.len(), 64);
    }

    #[tokio::test]
    async fn test_diff_reaches_both_versions() {
        let api = engine();
        api.ingest("telemetry".into(), json!({"lap": 1}))
            .await
            .unwrap();
        api.ingest("telemetry".into(), json!({"lap": 2, "pit": true}))
            .await
            .unwrap();

        let report = api.diff("telemetry", 1, 2).await.unwrap();

        assert_eq!(report.changes.added, ["pit".to_string()].into());
        assert!(report.changes.removed.is_empty());
    }

    #[tokio::test]
    async fn test_latest_for_unknown_source_is_not_found() {
        let api = engine();

        let err = api.latest("ghost").await.unwrap_err();

        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn test_document_listing_delegates_to_store() {
        let api = engine();
        api.ingest("telemetry".into(), json!({"lap": 1}))
            .await
            .unwrap();
        api.ingest("telemetry".into(), json!({"lap": 2}))
            .await
            .unwrap();

        let docs = DocumentOps::list(&api, "telemetry", Some(1), None)
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].payload["lap"], 2);
        assert!(docs[0].schema_id.starts_with("telemetry-v1-"));
        assert_eq!(docs[0].schema_id, docs[1].schema_id);
    }
}
