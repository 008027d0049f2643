#![deny(unused_variables)]
#![deny(unused_imports)]

//! Shared vocabulary for the image ingestion pipeline: data model, error
//! taxonomy, component traits and layered configuration.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    DecodeError, ErrorCategory, ExtractionError, FetchError, IngestionError, PreprocessError,
    Stage, StageError, StoreUnavailableError, UpsertError, ValidationError,
};
pub use types::{
    EmbeddingVector, IngestionRecord, InputTensor, Meta, PixelBuffer, UpsertResult, VectorRecord,
    CHANNELS, EMBEDDING_DIM, INPUT_SIZE, SOURCE_IMAGE, SOURCE_KEY,
};
