use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use imgvec_core::traits::VectorIndex;
use imgvec_core::{
    EmbeddingVector, IngestionRecord, Meta, StoreUnavailableError, UpsertError, UpsertResult, VectorRecord,
    EMBEDDING_DIM, SOURCE_IMAGE, SOURCE_KEY,
};

use crate::validate::{validate_id, validate_json, validate_values};

/// Fixed metadata attached to every image record.
pub fn image_metadata() -> Meta {
    Meta::from([(SOURCE_KEY.to_string(), SOURCE_IMAGE.to_string())])
}

/// Validates vectors and forwards them to a [`VectorIndex`]. Nothing reaches
/// the index unless validation passes; there is no retry.
#[derive(Clone)]
pub struct VectorStoreClient {
    index: Arc<dyn VectorIndex>,
    dimension: usize,
}

impl VectorStoreClient {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self::with_dimension(index, EMBEDDING_DIM)
    }

    pub fn with_dimension(index: Arc<dyn VectorIndex>, dimension: usize) -> Self {
        Self { index, dimension }
    }

    pub fn dimension(&self) -> usize { self.dimension }

    pub async fn upsert(&self, vector: &EmbeddingVector, id: &str, namespace: &str) -> Result<UpsertResult, UpsertError> {
        validate_values(vector.as_slice(), self.dimension)?;
        validate_id(id)?;
        self.write(id, vector.as_slice().to_vec(), namespace).await
    }

    /// Same as [`upsert`](Self::upsert) for a vector that arrives as untyped JSON.
    pub async fn upsert_json(&self, vector: &Value, id: &str, namespace: &str) -> Result<UpsertResult, UpsertError> {
        let values = validate_json(vector, self.dimension)?;
        validate_id(id)?;
        self.write(id, values, namespace).await
    }

    pub async fn fetch(&self, id: &str, namespace: &str) -> Result<Option<IngestionRecord>, StoreUnavailableError> {
        self.index.fetch(namespace, id).await
    }

    async fn write(&self, id: &str, values: Vec<f32>, namespace: &str) -> Result<UpsertResult, UpsertError> {
        let record = VectorRecord { id: id.to_string(), values, metadata: image_metadata() };
        debug!(id, namespace, dim = record.values.len(), "upserting vector");
        let result = self.index.upsert(namespace, std::slice::from_ref(&record)).await?;
        info!(id, namespace, upserted = result.upserted_count, "vector upserted");
        Ok(result)
    }
}
