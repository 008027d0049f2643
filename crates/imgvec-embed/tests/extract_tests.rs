use candle_core::Device;
use imgvec_core::config::ModelSettings;
use imgvec_core::traits::FeatureExtractor;
use imgvec_core::{ExtractionError, InputTensor, PixelBuffer, EMBEDDING_DIM};
use imgvec_embed::{get_default_extractor, to_nchw, FakeExtractor};
use imgvec_image::preprocess;

fn tensor_of(value: u8) -> InputTensor {
    let pixels = PixelBuffer::from_raw(32, 48, vec![value; 32 * 48 * 3]).unwrap();
    preprocess(&pixels).unwrap()
}

#[test]
fn fake_extractor_shapes_and_determinism() {
    let extractor = FakeExtractor::new(EMBEDDING_DIM);
    let v1 = extractor.extract(&tensor_of(40)).expect("extract");
    let v2 = extractor.extract(&tensor_of(40)).expect("extract");

    assert_eq!(v1.len(), 1280, "embedding dim is 1280");

    // Norm approximately 1.0
    let norm: f32 = v1.as_slice().iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Deterministic for same input
    assert_eq!(v1, v2);

    let other = extractor.extract(&tensor_of(41)).unwrap();
    assert_ne!(v1, other, "different pixels give different vectors");
}

#[test]
fn wrong_input_shape_is_an_extraction_error() {
    let extractor = FakeExtractor::new(EMBEDDING_DIM);
    let bad = InputTensor::new(vec![1, 3, 224, 224], vec![0.0; 3 * 224 * 224]).unwrap();
    match extractor.extract(&bad) {
        Err(ExtractionError::ShapeMismatch { expected, got }) => {
            assert_eq!(expected, vec![1, 224, 224, 3]);
            assert_eq!(got, vec![1, 3, 224, 224]);
        }
        other => panic!("expected shape mismatch, got {other:?}"),
    }
}

#[test]
fn fake_dimension_is_configurable() {
    let faulty = FakeExtractor::new(999);
    assert_eq!(faulty.dim(), 999);
    assert_eq!(faulty.extract(&tensor_of(7)).unwrap().len(), 999);
}

#[test]
fn default_extractor_honours_fake_switch() {
    // Force fake extractor to avoid loading model weights
    std::env::set_var("APP_USE_FAKE_EMBEDDINGS", "1");
    let extractor = get_default_extractor(&ModelSettings::default()).expect("extractor");
    assert_eq!(extractor.dim(), EMBEDDING_DIM);
    assert_eq!(extractor.extract(&tensor_of(0)).unwrap().len(), EMBEDDING_DIM);
}

#[test]
fn nhwc_is_permuted_to_nchw() {
    // 1x1x2x3: two pixels, rgb each
    let input = InputTensor::new(vec![1, 1, 2, 3], vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
    let t = to_nchw(&input, &Device::Cpu).unwrap();
    assert_eq!(t.dims(), &[1, 3, 1, 2]);
    let flat: Vec<f32> = t.flatten_all().unwrap().to_vec1().unwrap();
    assert_eq!(flat, vec![0.1, 0.4, 0.2, 0.5, 0.3, 0.6]);
}
