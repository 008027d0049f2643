use std::sync::Arc;

use imgvec_core::{EmbeddingVector, StoreUnavailableError, UpsertError, ValidationError, EMBEDDING_DIM, SOURCE_IMAGE};
use imgvec_vector::{InMemoryIndex, VectorStoreClient};
use serde_json::json;

fn vector(fill: f32) -> EmbeddingVector {
    EmbeddingVector::new(vec![fill; EMBEDDING_DIM])
}

fn setup() -> (Arc<InMemoryIndex>, VectorStoreClient) {
    let index = Arc::new(InMemoryIndex::new());
    let client = VectorStoreClient::new(index.clone());
    (index, client)
}

#[tokio::test]
async fn upsert_stores_record_with_image_source() {
    let (index, client) = setup();
    let res = client.upsert(&vector(0.25), "img-1", "").await.unwrap();
    assert_eq!(res.upserted_count, 1);
    assert_eq!(index.upsert_calls(), 1);

    let rec = client.fetch("img-1", "").await.unwrap().expect("record stored");
    assert_eq!(rec.vector.len(), EMBEDDING_DIM);
    assert_eq!(rec.source(), Some(SOURCE_IMAGE));
    assert_eq!(rec.namespace, "");
}

#[tokio::test]
async fn second_upsert_wins() {
    let (index, client) = setup();
    client.upsert(&vector(0.1), "img-1", "").await.unwrap();
    client.upsert(&vector(0.9), "img-1", "").await.unwrap();

    assert_eq!(index.len(), 1);
    let rec = client.fetch("img-1", "").await.unwrap().unwrap();
    assert!(rec.vector.as_slice().iter().all(|&x| x == 0.9));
}

#[tokio::test]
async fn namespaces_are_isolated() {
    let (_index, client) = setup();
    client.upsert(&vector(0.1), "img-1", "a").await.unwrap();
    assert!(client.fetch("img-1", "b").await.unwrap().is_none());
    assert!(client.fetch("img-1", "a").await.unwrap().is_some());
}

#[tokio::test]
async fn invalid_vector_never_reaches_index() {
    let (index, client) = setup();
    let short = EmbeddingVector::new(vec![0.0; 999]);
    let err = client.upsert(&short, "img-1", "").await.unwrap_err();
    assert_eq!(err, UpsertError::Validation(ValidationError::DimensionMismatch { expected: 1280, got: 999 }));

    let err = client.upsert(&vector(0.1), "", "").await.unwrap_err();
    assert_eq!(err, UpsertError::Validation(ValidationError::EmptyId));

    let err = client.upsert_json(&json!({"not": "a list"}), "img-1", "").await.unwrap_err();
    assert!(matches!(err, UpsertError::Validation(ValidationError::NotASequence { .. })));

    assert_eq!(index.upsert_calls(), 0);
    assert!(index.is_empty());
}

#[tokio::test]
async fn upsert_json_accepts_numbers() {
    let (_index, client) = setup();
    let values: Vec<f64> = (0..EMBEDDING_DIM).map(|i| i as f64 / 1280.0).collect();
    client.upsert_json(&json!(values), "img-2", "ns").await.unwrap();
    let rec = client.fetch("img-2", "ns").await.unwrap().unwrap();
    assert!((rec.vector.as_slice()[640] - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn outage_surfaces_as_store_error_and_keeps_prior_state() {
    let (index, client) = setup();
    client.upsert(&vector(0.1), "img-1", "").await.unwrap();

    index.set_outage(Some("connection reset"));
    let err = client.upsert(&vector(0.7), "img-1", "").await.unwrap_err();
    assert_eq!(err, UpsertError::Store(StoreUnavailableError::Transport("connection reset".into())));

    index.set_outage(None);
    let rec = client.fetch("img-1", "").await.unwrap().unwrap();
    assert!(rec.vector.as_slice().iter().all(|&x| x == 0.1));
}

#[tokio::test]
async fn custom_dimension_is_enforced() {
    let index = Arc::new(InMemoryIndex::new());
    let client = VectorStoreClient::with_dimension(index, 4);
    assert_eq!(client.dimension(), 4);
    client.upsert(&EmbeddingVector::new(vec![1.0, 2.0, 3.0, 4.0]), "x", "").await.unwrap();
    assert!(client.upsert(&vector(0.0), "y", "").await.is_err());
}
