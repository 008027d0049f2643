use anyhow::Result;
use candle_core::{Device, Tensor};

use imgvec_core::{ExtractionError, InputTensor};

/// Rejects anything that is not exactly `[1, 224, 224, 3]`. A mismatch here
/// means the preprocessor is broken, not that the image was bad.
pub fn check_input_shape(input: &InputTensor) -> Result<(), ExtractionError> {
    if input.has_model_shape() {
        return Ok(());
    }
    Err(ExtractionError::ShapeMismatch {
        expected: InputTensor::MODEL_SHAPE.to_vec(),
        got: input.shape().to_vec(),
    })
}

/// NHWC input -> contiguous NCHW tensor on `device`.
pub fn to_nchw(input: &InputTensor, device: &Device) -> Result<Tensor> {
    let nhwc = Tensor::from_slice(input.data(), input.shape(), device)?;
    Ok(nhwc.permute((0, 3, 1, 2))?.contiguous()?)
}
