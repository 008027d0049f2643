use async_trait::async_trait;

use crate::error::{DecodeError, ExtractionError, FetchError, StoreUnavailableError};
use crate::types::{EmbeddingVector, IngestionRecord, InputTensor, PixelBuffer, UpsertResult, VectorRecord};

#[async_trait]
pub trait ImageSource: Send + Sync {
    /// One attempt at retrieving the encoded image behind `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub trait ImageDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, DecodeError>;
}

pub trait FeatureExtractor: Send + Sync {
    /// Length of the vectors this extractor produces.
    fn dim(&self) -> usize;
    fn extract(&self, input: &InputTensor) -> Result<EmbeddingVector, ExtractionError>;
}

/// Persistent vector index. Implementations must make `upsert` atomic per
/// record: a reader observes either the previous row or the new one.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<UpsertResult, StoreUnavailableError>;
    async fn fetch(&self, namespace: &str, id: &str) -> Result<Option<IngestionRecord>, StoreUnavailableError>;
}
