use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid image url '{0}'")]
    InvalidUrl(String),

    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url} timed out")]
    Timeout { url: String },

    #[error("GET {url} failed: {message}")]
    Transport { url: String, message: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("image payload is empty")]
    Empty,

    #[error("malformed image: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreprocessError {
    #[error("cannot resize a zero-area image ({width}x{height})")]
    ZeroArea { width: usize, height: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("input tensor shape {got:?} does not match expected {expected:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    #[error("model forward failed: {0}")]
    Model(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("vector must be an array of numbers, got {found}")]
    NotASequence { found: String },

    #[error("vector length ({got}) does not match index dimension ({expected})")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("vector element at index {index} is not a number")]
    NonNumeric { index: usize },

    #[error("vector element at index {index} does not fit in a 32-bit float")]
    OutOfRange { index: usize },

    #[error("record id must not be empty")]
    EmptyId,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreUnavailableError {
    #[error("vector store unreachable: {0}")]
    Transport(String),

    #[error("vector store rejected upsert with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("vector store backend error: {0}")]
    Backend(String),
}

/// Outcome of a failed call to the vector store client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpsertError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreUnavailableError),
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    Decode,
    Preprocess,
    Extract,
    Upsert,
}

impl Stage {
    pub const ALL: [Stage; 5] = [Stage::Fetch, Stage::Decode, Stage::Preprocess, Stage::Extract, Stage::Upsert];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Decode => "decode",
            Stage::Preprocess => "preprocess",
            Stage::Extract => "extract",
            Stage::Upsert => "upsert",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse grouping reported to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Fetch,
    Decode,
    Preprocess,
    Extraction,
    Validation,
    Store,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Fetch => "fetch",
            ErrorCategory::Decode => "decode",
            ErrorCategory::Preprocess => "preprocess",
            ErrorCategory::Extraction => "extraction",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Store => "store",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Union of the per-stage error kinds, unchanged in kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreUnavailableError),
}

impl StageError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            StageError::Fetch(_) => ErrorCategory::Fetch,
            StageError::Decode(_) => ErrorCategory::Decode,
            StageError::Preprocess(_) => ErrorCategory::Preprocess,
            StageError::Extraction(_) => ErrorCategory::Extraction,
            StageError::Validation(_) => ErrorCategory::Validation,
            StageError::Store(_) => ErrorCategory::Store,
        }
    }
}

impl From<UpsertError> for StageError {
    fn from(err: UpsertError) -> Self {
        match err {
            UpsertError::Validation(e) => StageError::Validation(e),
            UpsertError::Store(e) => StageError::Store(e),
        }
    }
}

/// Terminal failure of one ingestion request: the stage that failed and
/// what went wrong there.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("ingestion failed at {stage} stage: {kind}")]
pub struct IngestionError {
    pub stage: Stage,
    #[source]
    pub kind: StageError,
}

impl IngestionError {
    pub fn new(stage: Stage, kind: impl Into<StageError>) -> Self {
        Self { stage, kind: kind.into() }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}
