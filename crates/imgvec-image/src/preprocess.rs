use imgvec_core::{InputTensor, PixelBuffer, PreprocessError, CHANNELS, INPUT_SIZE};

/// Bilinear resize to `out_h x out_w`, returning interleaved f32 samples.
///
/// Uses the legacy tensor-library convention: no corner alignment and no
/// half-pixel centres, so output pixel `o` samples source coordinate
/// `o * in / out`. Interpolation is done in f32 with no rounding back to u8.
pub fn resize_bilinear(pixels: &PixelBuffer, out_h: usize, out_w: usize) -> Result<Vec<f32>, PreprocessError> {
    let mut out = vec![0.0; out_h * out_w * CHANNELS];
    resize_into(pixels, out_h, out_w, &mut out)?;
    Ok(out)
}

fn resize_into(pixels: &PixelBuffer, out_h: usize, out_w: usize, out: &mut [f32]) -> Result<(), PreprocessError> {
    let (in_h, in_w) = (pixels.height(), pixels.width());
    if pixels.is_empty() {
        return Err(PreprocessError::ZeroArea { width: in_w, height: in_h });
    }
    let src = pixels.as_raw();
    let sample = |y: usize, x: usize, c: usize| f32::from(src[(y * in_w + x) * CHANNELS + c]);

    let taps = |in_len: usize, out_len: usize| -> Vec<(usize, usize, f32)> {
        let scale = in_len as f32 / out_len as f32;
        (0..out_len)
            .map(|o| {
                let pos = o as f32 * scale;
                let lo = (pos.floor() as usize).min(in_len - 1);
                let hi = (lo + 1).min(in_len - 1);
                (lo, hi, pos - lo as f32)
            })
            .collect()
    };
    let rows = taps(in_h, out_h);
    let cols = taps(in_w, out_w);

    let grid = rows.iter().flat_map(|&row| cols.iter().map(move |&col| (row, col)));
    for (((y0, y1, dy), (x0, x1, dx)), px) in grid.zip(out.chunks_exact_mut(CHANNELS)) {
        for (c, v) in px.iter_mut().enumerate() {
            let top_left = sample(y0, x0, c);
            let top_right = sample(y0, x1, c);
            let bottom_left = sample(y1, x0, c);
            let bottom_right = sample(y1, x1, c);
            let top = top_left + (top_right - top_left) * dx;
            let bottom = bottom_left + (bottom_right - bottom_left) * dx;
            *v = top + (bottom - top) * dy;
        }
    }
    Ok(())
}

/// PixelBuffer -> `[1, 224, 224, 3]` tensor in `[0, 1]`.
///
/// Resize first, then scale by 1/255; the batch dimension is part of the
/// tensor shape from the start.
pub fn preprocess(pixels: &PixelBuffer) -> Result<InputTensor, PreprocessError> {
    let mut tensor = InputTensor::zeros(InputTensor::MODEL_SHAPE.to_vec());
    resize_into(pixels, INPUT_SIZE, INPUT_SIZE, tensor.data_mut())?;
    for v in tensor.data_mut() {
        *v /= 255.0;
    }
    Ok(tensor)
}
