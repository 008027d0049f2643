use candle_core::{DType, Device, Shape, Tensor};
use candle_nn::var_builder::SimpleBackend;
use candle_nn::{Init, VarBuilder};
use imgvec_core::traits::FeatureExtractor;
use imgvec_core::{PixelBuffer, EMBEDDING_DIM};
use imgvec_embed::MobileNetExtractor;
use imgvec_image::preprocess;

/// Zero weights of the requested shape. Like a real checkpoint, it holds no
/// tensor with a zero-sized dimension, so the optional kernel-0 depthwise
/// convs are skipped.
struct ShapedZeros;

impl SimpleBackend for ShapedZeros {
    fn get(&self, s: Shape, name: &str, _: Init, dtype: DType, dev: &Device) -> candle_core::Result<Tensor> {
        if s.dims().contains(&0) {
            candle_core::bail!("no tensor {name} with shape {s:?}")
        }
        Tensor::zeros(s, dtype, dev)
    }

    fn get_unchecked(&self, name: &str, _: DType, _: &Device) -> candle_core::Result<Tensor> {
        candle_core::bail!("{name} requested without a shape")
    }

    fn contains_tensor(&self, _: &str) -> bool {
        true
    }
}

fn zero_weights() -> VarBuilder<'static> {
    VarBuilder::from_backend(Box::new(ShapedZeros), DType::F32, Device::Cpu)
}

#[test]
fn backbone_with_head_yields_full_embedding() {
    let pixels = PixelBuffer::from_raw(40, 30, vec![90; 40 * 30 * 3]).unwrap();
    let input = preprocess(&pixels).unwrap();

    for variant in ["small", "medium"] {
        let extractor = MobileNetExtractor::from_var_builder(variant, zero_weights(), Device::Cpu).expect("model builds");
        let v = extractor.extract(&input).expect("extract");
        assert_eq!(v.len(), EMBEDDING_DIM, "{variant}");
        assert_eq!(v.len(), extractor.dim(), "{variant}");
        assert_eq!(extractor.variant(), variant);
    }
}

#[test]
fn unknown_variant_is_rejected() {
    let err = MobileNetExtractor::from_var_builder("tiny", zero_weights(), Device::Cpu).err().expect("error");
    assert!(err.to_string().contains("tiny"));
}
