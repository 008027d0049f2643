//! REST client for a hosted vector index.
//!
//! Wire format:
//! - `POST {host}/vectors/upsert` with `{ "vectors": [{ id, values, metadata }], "namespace": ns }`,
//!   answered by `{ "upsertedCount": n }`
//! - `GET {host}/vectors/fetch?ids=<id>&namespace=<ns>`, answered by
//!   `{ "vectors": { "<id>": { id, values, metadata } } }`

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use imgvec_core::traits::VectorIndex;
use imgvec_core::{EmbeddingVector, IngestionRecord, StoreUnavailableError, UpsertResult, VectorRecord};

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Deserialize)]
struct FetchResponse {
    #[serde(default)]
    vectors: HashMap<String, VectorRecord>,
}

#[derive(Clone)]
pub struct RemoteIndex {
    client: Client,
    host: String,
    api_key: Option<String>,
}

impl RemoteIndex {
    pub fn new(host: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self { client, host: host.trim_end_matches('/').to_string(), api_key })
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Api-Key", key),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, StoreUnavailableError> {
        let response = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| StoreUnavailableError::Transport(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreUnavailableError::Rejected { status: status.as_u16(), body })
    }
}

#[async_trait]
impl VectorIndex for RemoteIndex {
    async fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<UpsertResult, StoreUnavailableError> {
        let url = format!("{}/vectors/upsert", self.host);
        let req = self.client.post(&url).json(&UpsertRequest { vectors: records, namespace });
        let response = self.send(req).await?;
        let ack: UpsertResult = response
            .json()
            .await
            .map_err(|e| StoreUnavailableError::Transport(format!("unreadable upsert acknowledgement: {}", e)))?;
        debug!(url, namespace, upserted = ack.upserted_count, "remote upsert acknowledged");
        Ok(ack)
    }

    async fn fetch(&self, namespace: &str, id: &str) -> Result<Option<IngestionRecord>, StoreUnavailableError> {
        let url = format!("{}/vectors/fetch", self.host);
        let req = self.client.get(&url).query(&[("ids", id), ("namespace", namespace)]);
        let mut body: FetchResponse = self
            .send(req)
            .await?
            .json()
            .await
            .map_err(|e| StoreUnavailableError::Transport(format!("unreadable fetch response: {}", e)))?;
        Ok(body.vectors.remove(id).map(|r| IngestionRecord {
            id: r.id,
            vector: EmbeddingVector::new(r.values),
            namespace: namespace.to_string(),
            metadata: r.metadata,
        }))
    }
}
