//! LanceDB-backed vector index.
//!
//! Rows are keyed by `(namespace, id)`; writes go through `merge_insert`, so a
//! re-upsert replaces the whole row in a single commit and readers see either
//! the old row or the new one.

use anyhow::Result;
use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Connection;
use std::sync::Arc;
use tracing::{debug, info};

use imgvec_core::traits::VectorIndex;
use imgvec_core::{EmbeddingVector, IngestionRecord, Meta, StoreUnavailableError, UpsertResult, VectorRecord, SOURCE_KEY};

use crate::schema::{build_records_schema, EMBEDDING_DIM};
use crate::table::{ensure_records_table, open_db};

fn backend<E: std::fmt::Display>(e: E) -> StoreUnavailableError {
    StoreUnavailableError::Backend(e.to_string())
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[derive(Clone)]
pub struct LanceIndex { conn: Connection, table: String }

impl LanceIndex {
    /// Opens the database at `uri` and makes sure the records table exists.
    pub async fn connect(uri: &str, table: &str) -> Result<Self> {
        let conn = open_db(uri).await?;
        ensure_records_table(&conn, table).await?;
        info!(uri, table, "connected to LanceDB");
        Ok(Self { conn, table: table.to_string() })
    }

    fn records_to_batch(&self, namespace: &str, records: &[VectorRecord]) -> Result<RecordBatch, StoreUnavailableError> {
        let mut namespaces = Vec::new(); let mut ids = Vec::new(); let mut sources: Vec<Option<String>> = Vec::new(); let mut metas = Vec::new(); let mut times = Vec::new(); let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        let now = Utc::now().timestamp_millis();
        for r in records {
            if r.values.len() != EMBEDDING_DIM as usize {
                return Err(backend(format!("record '{}' has {} values; table expects {}", r.id, r.values.len(), EMBEDDING_DIM)));
            }
            namespaces.push(namespace.to_string());
            ids.push(r.id.clone());
            sources.push(r.metadata.get(SOURCE_KEY).cloned());
            metas.push(serde_json::to_string(&r.metadata).map_err(backend)?);
            times.push(now);
            vectors.push(Some(r.values.iter().map(|&x| Some(x)).collect()));
        }
        RecordBatch::try_new(
            build_records_schema(),
            vec![
                Arc::new(StringArray::from(namespaces)),
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(sources)),
                Arc::new(StringArray::from(metas)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), EMBEDDING_DIM)),
                Arc::new(TimestampMillisecondArray::from(times)),
            ],
        )
        .map_err(backend)
    }
}

fn row_to_record(batch: &RecordBatch, i: usize) -> Result<IngestionRecord, StoreUnavailableError> {
    let text = |name: &str| -> Result<String, StoreUnavailableError> {
        batch
            .column_by_name(name)
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .map(|c| c.value(i).to_string())
            .ok_or_else(|| backend(format!("{} column missing", name)))
    };
    let vec_col = batch
        .column_by_name("vector")
        .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
        .ok_or_else(|| backend("vector column missing"))?;
    let values = if vec_col.is_valid(i) {
        vec_col.value(i).as_primitive::<arrow_array::types::Float32Type>().values().to_vec()
    } else {
        Vec::new()
    };
    let metadata: Meta = serde_json::from_str(&text("metadata")?).map_err(backend)?;
    Ok(IngestionRecord { id: text("id")?, vector: EmbeddingVector::new(values), namespace: text("namespace")?, metadata })
}

#[async_trait]
impl VectorIndex for LanceIndex {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<UpsertResult, StoreUnavailableError> {
        if records.is_empty() { return Ok(UpsertResult::default()); }
        let batch = self.records_to_batch(namespace, records)?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), build_records_schema()));
        let t = self.conn.open_table(&self.table).execute().await.map_err(backend)?;
        // Upsert behavior via merge_insert: (namespace, id) is unique
        let mut mi = t.merge_insert(&["namespace", "id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        let res = mi.execute(reader).await.map_err(backend)?;
        let upserted_count = (res.num_inserted_rows + res.num_updated_rows) as usize;
        debug!(table = %self.table, namespace, inserted = res.num_inserted_rows, updated = res.num_updated_rows, "merge_insert committed");
        Ok(UpsertResult { upserted_count })
    }

    async fn fetch(&self, namespace: &str, id: &str) -> Result<Option<IngestionRecord>, StoreUnavailableError> {
        let t = self.conn.open_table(&self.table).execute().await.map_err(backend)?;
        let filter = format!("namespace = {} AND id = {}", quote(namespace), quote(id));
        let mut stream = t.query().only_if(filter).limit(1).execute().await.map_err(backend)?;
        while let Some(batch) = stream.try_next().await.map_err(backend)? {
            if batch.num_rows() == 0 { continue; }
            return row_to_record(&batch, 0).map(Some);
        }
        Ok(None)
    }
}
