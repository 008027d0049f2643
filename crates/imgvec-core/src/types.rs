//! Domain types passed between pipeline stages.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Spatial size (height and width) of the model input.
pub const INPUT_SIZE: usize = 224;
/// Color channels kept after decoding.
pub const CHANNELS: usize = 3;
/// Length of every embedding; must match the index dimensionality.
pub const EMBEDDING_DIM: usize = 1280;

pub const SOURCE_KEY: &str = "source";
pub const SOURCE_IMAGE: &str = "image";

pub type Meta = HashMap<String, String>;

/// Decoded raster, row-major `(row, column, channel)` with exactly three
/// channels per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw interleaved RGB samples. Returns `None` when `data` does not
    /// hold exactly `width * height * 3` samples.
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        let expected = width.checked_mul(height)?.checked_mul(CHANNELS)?;
        if data.len() != expected {
            return None;
        }
        Some(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn get(&self, row: usize, col: usize, channel: usize) -> Option<u8> {
        if row >= self.height || col >= self.width || channel >= CHANNELS {
            return None;
        }
        self.data.get((row * self.width + col) * CHANNELS + channel).copied()
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }
}

/// Dense f32 tensor in NHWC layout.
///
/// The shape is carried explicitly; a well-formed model input is always
/// `[1, INPUT_SIZE, INPUT_SIZE, CHANNELS]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl InputTensor {
    pub const MODEL_SHAPE: [usize; 4] = [1, INPUT_SIZE, INPUT_SIZE, CHANNELS];

    /// Returns `None` when the element count does not match the shape.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Option<Self> {
        let expected = shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))?;
        if data.len() != expected {
            return None;
        }
        Some(Self { shape, data })
    }

    /// Zero-filled tensor of `shape`.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self { shape, data: vec![0.0; len] }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn has_model_shape(&self) -> bool {
        self.shape == Self::MODEL_SHAPE
    }

    pub fn into_raw(self) -> (Vec<usize>, Vec<f32>) {
        (self.shape, self.data)
    }
}

/// Feature vector produced by an extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// One row on the wire: `{ id, values, metadata }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Meta,
}

/// The persisted entity.
///
/// - `id`: caller-supplied identifier, unique per logical image
/// - `namespace`: index partition, empty for the default namespace
/// - `metadata`: always carries `source = "image"` for ingested records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionRecord {
    pub id: String,
    pub vector: EmbeddingVector,
    pub namespace: String,
    pub metadata: Meta,
}

impl IngestionRecord {
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// Store acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UpsertResult {
    #[serde(rename = "upsertedCount", default)]
    pub upserted_count: usize,
}
