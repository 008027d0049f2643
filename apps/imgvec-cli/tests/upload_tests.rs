use axum::routing::get;
use axum::Router;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::{json, Value};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use imgvec_cli::{serve, MISSING_FIELDS};
use imgvec_core::config::FetchSettings;
use imgvec_core::EMBEDDING_DIM;
use imgvec_embed::FakeExtractor;
use imgvec_image::{HttpFetcher, RasterDecoder};
use imgvec_pipeline::IngestPipeline;
use imgvec_vector::{InMemoryIndex, VectorStoreClient};

async fn listen(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn jpeg() -> Vec<u8> {
    let img = RgbImage::from_fn(32, 32, |x, y| image::Rgb([x as u8 * 8, y as u8 * 8, 64]));
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg).unwrap();
    out
}

async fn start(index: Arc<InMemoryIndex>) -> (String, SocketAddr) {
    let images = listen(Router::new().route("/photo.jpg", get(|| async { jpeg() }))).await;
    let pipeline = IngestPipeline::new(
        Arc::new(HttpFetcher::new(&FetchSettings::default()).unwrap()),
        Arc::new(RasterDecoder),
        Arc::new(FakeExtractor::new(EMBEDDING_DIM)),
        VectorStoreClient::new(index),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        serve(listener, pipeline).await.unwrap();
    });
    (format!("http://{addr}/upload"), images)
}

async fn post(url: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new().post(url).json(&body).send().await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn upload_ingests_and_confirms() {
    let index = Arc::new(InMemoryIndex::new());
    let (upload, images) = start(index.clone()).await;

    let (status, body) = post(&upload, json!({ "imageUrl": format!("http://{images}/photo.jpg"), "id": "img-1" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Vector for img-1 upserted successfully!");
    assert_eq!(index.len(), 1);
}

#[tokio::test]
async fn missing_fields_are_rejected_before_ingest() {
    let index = Arc::new(InMemoryIndex::new());
    let (upload, images) = start(index.clone()).await;

    for body in [
        json!({ "id": "img-1" }),
        json!({ "imageUrl": format!("http://{images}/photo.jpg") }),
        json!({ "imageUrl": "", "id": "img-1" }),
        json!({}),
    ] {
        let (status, resp) = post(&upload, body).await;
        assert_eq!(status, 400);
        assert_eq!(resp["error"], MISSING_FIELDS);
    }
    assert_eq!(index.upsert_calls(), 0);
}

#[tokio::test]
async fn ingest_failure_reports_stage_and_category() {
    let index = Arc::new(InMemoryIndex::new());
    let (upload, images) = start(index.clone()).await;

    let (status, body) = post(&upload, json!({ "imageUrl": format!("http://{images}/nope.jpg"), "id": "img-2" })).await;
    assert_eq!(status, 500);
    assert_eq!(body["stage"], "fetch");
    assert_eq!(body["category"], "fetch");
    assert!(body["error"].as_str().unwrap().contains("404"));
    assert_eq!(index.upsert_calls(), 0);
}
