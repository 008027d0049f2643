use anyhow::Context;

use imgvec_cli::{init_tracing, serve};
use imgvec_core::config::Config;
use imgvec_pipeline::IngestPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = Config::load()?.settings()?;

    // Model and store come up before the port is bound.
    let pipeline = IngestPipeline::from_settings(&settings).await.context("failed to initialise ingest pipeline")?;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("failed to bind {}", addr))?;
    serve(listener, pipeline).await
}
