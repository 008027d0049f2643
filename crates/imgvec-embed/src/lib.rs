use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device, Module};
use candle_nn::{batch_norm, conv2d_no_bias, Activation, Conv2dConfig, Func, VarBuilder};
use candle_transformers::models::mobilenetv4;
use tracing::{debug, info, warn};

use imgvec_core::config::{expand_path, ModelSettings};
use imgvec_core::traits::FeatureExtractor;
use imgvec_core::{EmbeddingVector, ExtractionError, InputTensor, EMBEDDING_DIM};

pub mod device;
pub mod pool;
pub mod tensor;

pub use device::select_device;
pub use pool::global_avg_pool;
pub use tensor::{check_input_shape, to_nchw};

/// Channels out of the last backbone block, for every variant.
pub const BACKBONE_CHANNELS: usize = 960;

/// MobileNetV4 backbone plus the timm feature head (`conv_head`, `norm_head`,
/// activation), without the classifier. Produces the average-pooled 1280-d
/// feature vector of the image.
pub struct MobileNetExtractor { backbone: Func<'static>, head: Func<'static>, device: Device, variant: String }

impl MobileNetExtractor {
    /// Loads `model.safetensors` from the resolved model directory.
    pub fn load(settings: &ModelSettings) -> Result<Self> {
        let device = select_device();
        let model_dir = resolve_model_dir(settings.dir.as_deref())?;
        let weights_path = model_dir.join("model.safetensors");
        info!(variant = %settings.variant, path = %weights_path.display(), "loading MobileNetV4 weights");
        let weights = candle_core::safetensors::load(&weights_path, &device)
            .map_err(|e| anyhow!("Failed to load weights from {}: {}", weights_path.display(), e))?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let extractor = Self::from_var_builder(&settings.variant, vb, device)?;
        info!(variant = %settings.variant, "MobileNetV4 model loaded");
        Ok(extractor)
    }

    /// Builds the graph from any weight source and checks that a blank image
    /// comes out as exactly `EMBEDDING_DIM` values.
    pub fn from_var_builder(variant: &str, vb: VarBuilder, device: Device) -> Result<Self> {
        let (cfg, act) = variant_config(variant)?;
        let backbone = mobilenetv4::mobilenetv4_no_final_layer(&cfg, vb.clone())?;
        let head = feature_head(act, vb)?;
        let extractor = Self { backbone, head, device, variant: variant.to_string() };

        let blank = InputTensor::new(InputTensor::MODEL_SHAPE.to_vec(), vec![0.0; InputTensor::MODEL_SHAPE.iter().product()])
            .ok_or_else(|| anyhow!("blank input does not match the model shape"))?;
        let got = extractor.forward(&blank)?.len();
        if got != EMBEDDING_DIM {
            return Err(anyhow!("MobileNetV4 '{}' produces {} features, expected {}", variant, got, EMBEDDING_DIM));
        }
        Ok(extractor)
    }

    pub fn variant(&self) -> &str { &self.variant }

    fn forward(&self, input: &InputTensor) -> Result<Vec<f32>> {
        let xs = to_nchw(input, &self.device)?;
        let features = self.backbone.forward(&xs)?;
        let projected = self.head.forward(&features)?;
        let pooled = global_avg_pool(&projected)?;
        Ok(pooled.to_device(&Device::Cpu)?.flatten_all()?.to_vec1::<f32>()?)
    }
}

/// 1x1 projection 960 -> 1280 with batch norm and the variant's activation.
fn feature_head(act: Activation, vb: VarBuilder) -> Result<Func<'static>> {
    let conv = conv2d_no_bias(BACKBONE_CHANNELS, EMBEDDING_DIM, 1, Conv2dConfig::default(), vb.pp("conv_head"))?;
    let norm = batch_norm(EMBEDDING_DIM, 1e-5, vb.pp("norm_head"))?;
    Ok(Func::new(move |xs| xs.apply(&conv)?.apply_t(&norm, false)?.apply(&act)))
}

impl FeatureExtractor for MobileNetExtractor {
    fn dim(&self) -> usize { EMBEDDING_DIM }

    fn extract(&self, input: &InputTensor) -> Result<EmbeddingVector, ExtractionError> {
        check_input_shape(input)?;
        let start = Instant::now();
        let values = self.forward(input).map_err(|e| ExtractionError::Model(e.to_string()))?;
        let elapsed_ms = start.elapsed().as_millis();
        if elapsed_ms > 500 { warn!(elapsed_ms, "slow feature extraction"); }
        debug!(len = values.len(), elapsed_ms, head = ?&values[..values.len().min(10)], "features extracted");
        Ok(EmbeddingVector::new(values))
    }
}

/// Deterministic stand-in for the real model: hashes the tensor contents
/// into an L2-normalized vector of `dim` values.
pub struct FakeExtractor { dim: usize }

impl FakeExtractor { pub fn new(dim: usize) -> Self { Self { dim } } }

impl FeatureExtractor for FakeExtractor {
    fn dim(&self) -> usize { self.dim }

    fn extract(&self, input: &InputTensor) -> Result<EmbeddingVector, ExtractionError> {
        use std::hash::Hasher; use twox_hash::XxHash64;
        check_input_shape(input)?;
        let mut hasher = XxHash64::with_seed(0);
        for x in input.data() { hasher.write_u32(x.to_bits()); }
        let seed = hasher.finish();
        let mut v: Vec<f32> = (0..self.dim).map(|i| { let mut h = XxHash64::with_seed(seed); h.write_usize(i); (((h.finish() >> 32) as u32) as f32) / (u32::MAX as f32) }).collect();
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6); for x in &mut v { *x /= norm; }
        Ok(EmbeddingVector::new(v))
    }
}

pub fn get_default_extractor(settings: &ModelSettings) -> Result<Arc<dyn FeatureExtractor>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake { info!("using FakeExtractor"); return Ok(Arc::new(FakeExtractor::new(EMBEDDING_DIM))); }
    Ok(Arc::new(MobileNetExtractor::load(settings)?))
}

fn variant_config(name: &str) -> Result<(mobilenetv4::Config, Activation)> {
    match name {
        "small" => Ok((mobilenetv4::Config::small(), Activation::Relu)),
        "medium" => Ok((mobilenetv4::Config::medium(), Activation::Relu)),
        "large" => Ok((mobilenetv4::Config::large(), Activation::Relu)),
        "hybrid_medium" => Ok((mobilenetv4::Config::hybrid_medium(), Activation::Relu)),
        "hybrid_large" => Ok((mobilenetv4::Config::hybrid_large(), Activation::Gelu)),
        other => Err(anyhow!("Unknown MobileNetV4 variant '{}'", other)),
    }
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured { let p = expand_path(dir); if p.exists() { info!(dir = %p.display(), "using configured model dir"); return Ok(p); } warn!(dir = %p.display(), "configured model dir does not exist"); }
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { info!(dir = %p.display(), "using APP_MODEL_DIR"); return Ok(p); } }
    if let Ok(dir) = std::env::var("MODEL_DIR") { let p = PathBuf::from(&dir); if p.exists() { info!(dir = %p.display(), "using MODEL_DIR"); return Ok(p); } }
    let root = Path::new("../models/mobilenetv4"); if root.exists() { info!(dir = %root.display(), "using model dir"); return Ok(root.to_path_buf()); }
    let local = Path::new("models/mobilenetv4"); if local.exists() { info!(dir = %local.display(), "using model dir"); return Ok(local.to_path_buf()); }
    Err(anyhow!("Could not locate MobileNetV4 model directory"))
}
