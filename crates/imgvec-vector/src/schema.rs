use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub const EMBEDDING_DIM: i32 = imgvec_core::EMBEDDING_DIM as i32;

/// One row per `(namespace, id)`.
pub fn build_records_schema() -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("namespace", DataType::Utf8, false),
		Field::new("id", DataType::Utf8, false),
		Field::new("source", DataType::Utf8, true),
		Field::new("metadata", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), EMBEDDING_DIM), true),
		Field::new("updated_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
	]))
}
