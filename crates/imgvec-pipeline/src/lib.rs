//! imgvec-pipeline
//!
//! Runs one ingestion request through fetch, decode, preprocess, extract and
//! upsert, in that order. The first failing stage ends the request and is
//! reported with its name; nothing is written unless every earlier stage
//! succeeded.

use anyhow::Result;
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use imgvec_core::config::Settings;
use imgvec_core::traits::{FeatureExtractor, ImageDecoder, ImageSource};
use imgvec_core::{
    DecodeError, EmbeddingVector, ExtractionError, FetchError, IngestionError, IngestionRecord, InputTensor,
    PixelBuffer, PreprocessError, Stage, StageError, UpsertError, UpsertResult,
};
use imgvec_embed::get_default_extractor;
use imgvec_image::{preprocess, HttpFetcher, RasterDecoder};
use imgvec_vector::{image_metadata, open_client, VectorStoreClient};

/// Runs `f` on the blocking pool. A panic inside `f` is re-raised on the
/// calling task.
async fn blocking<T, E, F>(f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(res) => res,
        Err(join_err) => {
            let payload = join_err
                .try_into_panic()
                .unwrap_or_else(|e| -> Box<dyn Any + Send> { Box::new(format!("blocking task did not complete: {}", e)) });
            std::panic::resume_unwind(payload)
        }
    }
}

#[derive(Clone)]
pub struct IngestPipeline {
    source: Arc<dyn ImageSource>,
    decoder: Arc<dyn ImageDecoder>,
    extractor: Arc<dyn FeatureExtractor>,
    store: VectorStoreClient,
    namespace: String,
}

impl IngestPipeline {
    pub fn new(
        source: Arc<dyn ImageSource>,
        decoder: Arc<dyn ImageDecoder>,
        extractor: Arc<dyn FeatureExtractor>,
        store: VectorStoreClient,
    ) -> Self {
        Self { source, decoder, extractor, store, namespace: String::new() }
    }

    /// Builds the production pipeline: HTTP fetcher, raster decoder, the
    /// configured extractor and the configured store.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let source = Arc::new(HttpFetcher::new(&settings.fetch)?);
        let model = settings.model.clone();
        let extractor = tokio::task::spawn_blocking(move || get_default_extractor(&model)).await??;
        let store = open_client(&settings.store).await?;
        info!(backend = ?settings.store.backend, dim = extractor.dim(), "ingest pipeline ready");
        Ok(Self::new(source, Arc::new(RasterDecoder), extractor, store).with_namespace(&settings.store.namespace))
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub fn namespace(&self) -> &str { &self.namespace }

    pub fn store(&self) -> &VectorStoreClient { &self.store }

    pub async fn fetch_stage(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.source.fetch(url).await
    }

    pub async fn decode_stage(&self, bytes: Vec<u8>) -> Result<PixelBuffer, DecodeError> {
        let decoder = self.decoder.clone();
        blocking(move || decoder.decode(&bytes)).await
    }

    pub async fn preprocess_stage(&self, pixels: PixelBuffer) -> Result<InputTensor, PreprocessError> {
        blocking(move || preprocess(&pixels)).await
    }

    pub async fn extract_stage(&self, tensor: InputTensor) -> Result<EmbeddingVector, ExtractionError> {
        let extractor = self.extractor.clone();
        blocking(move || extractor.extract(&tensor)).await
    }

    pub async fn upsert_stage(&self, vector: &EmbeddingVector, id: &str) -> Result<UpsertResult, UpsertError> {
        self.store.upsert(vector, id, &self.namespace).await
    }

    /// Fetches the image at `url`, embeds it and stores the vector under `id`.
    pub async fn ingest(&self, url: &str, id: &str) -> Result<IngestionRecord, IngestionError> {
        let started = Instant::now();
        let fail = |stage: Stage, err: StageError| {
            let err = IngestionError::new(stage, err);
            warn!(url, id, stage = %stage, category = %err.category(), error = %err.kind, "ingest failed");
            err
        };

        let bytes = self.fetch_stage(url).await.map_err(|e| fail(Stage::Fetch, e.into()))?;
        debug!(url, bytes = bytes.len(), "fetched");

        let pixels = self.decode_stage(bytes).await.map_err(|e| fail(Stage::Decode, e.into()))?;
        debug!(width = pixels.width(), height = pixels.height(), "decoded");

        let tensor = self.preprocess_stage(pixels).await.map_err(|e| fail(Stage::Preprocess, e.into()))?;
        debug!(shape = ?tensor.shape(), "preprocessed");

        let vector = self.extract_stage(tensor).await.map_err(|e| fail(Stage::Extract, e.into()))?;
        debug!(len = vector.len(), head = ?&vector.as_slice()[..vector.len().min(5)], "extracted");

        self.upsert_stage(&vector, id).await.map_err(|e| fail(Stage::Upsert, e.into()))?;
        info!(url, id, namespace = %self.namespace, elapsed_ms = started.elapsed().as_millis() as u64, "ingested");

        Ok(IngestionRecord { id: id.to_string(), vector, namespace: self.namespace.clone(), metadata: image_metadata() })
    }
}
