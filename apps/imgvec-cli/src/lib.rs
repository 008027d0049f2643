//! Shared pieces of the `imgvec-ingest` and `imgvec-server` binaries.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use imgvec_pipeline::IngestPipeline;

pub const MISSING_FIELDS: &str = "Missing 'imageUrl' or 'id' in request body.";

/// Installs the fmt subscriber. `RUST_LOG` wins; otherwise `info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub id: Option<String>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

async fn upload(State(pipeline): State<IngestPipeline>, body: Option<Json<UploadRequest>>) -> Response {
    let Some(Json(req)) = body else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": MISSING_FIELDS }))).into_response();
    };
    let (Some(url), Some(id)) = (non_empty(req.image_url), non_empty(req.id)) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": MISSING_FIELDS }))).into_response();
    };
    match pipeline.ingest(&url, &id).await {
        Ok(record) => {
            let message = format!("Vector for {} upserted successfully!", record.id);
            (StatusCode::OK, Json(json!({ "message": message }))).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": err.to_string(),
                "stage": err.stage.as_str(),
                "category": err.category().as_str(),
            })),
        )
            .into_response(),
    }
}

pub fn router(pipeline: IngestPipeline) -> Router {
    Router::new().route("/upload", post(upload)).with_state(pipeline)
}

/// Serves [`router`] on `listener` until the process is stopped.
pub async fn serve(listener: tokio::net::TcpListener, pipeline: IngestPipeline) -> anyhow::Result<()> {
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(pipeline)).await?;
    Ok(())
}
