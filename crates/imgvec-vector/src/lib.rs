use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::info;

use imgvec_core::config::{resolve_with_base, StoreBackend, StoreSettings};
use imgvec_core::traits::VectorIndex;

pub mod client;
pub mod lance;
pub mod memory;
pub mod remote;
pub mod schema;
pub mod table;
pub mod validate;

pub use client::{image_metadata, VectorStoreClient};
pub use lance::LanceIndex;
pub use memory::InMemoryIndex;
pub use remote::RemoteIndex;
pub use validate::{validate_id, validate_json, validate_values};

/// Connects the backend named in `settings`.
pub async fn open_index(settings: &StoreSettings) -> Result<Arc<dyn VectorIndex>> {
    match settings.backend {
        StoreBackend::Lance => {
            let base = std::env::current_dir()?;
            let path = resolve_with_base(&base, &settings.uri);
            let index = LanceIndex::connect(&path.to_string_lossy(), &settings.table).await?;
            Ok(Arc::new(index))
        }
        StoreBackend::Remote => {
            let host = settings
                .host
                .as_deref()
                .ok_or_else(|| anyhow!("store.host is required for the remote backend"))?;
            info!(host, "using remote vector index");
            Ok(Arc::new(RemoteIndex::new(host, settings.api_key.clone())?))
        }
    }
}

/// Opens the configured index and wraps it in a validating client.
pub async fn open_client(settings: &StoreSettings) -> Result<VectorStoreClient> {
    let index = open_index(settings).await?;
    Ok(VectorStoreClient::with_dimension(index, settings.dimension))
}
