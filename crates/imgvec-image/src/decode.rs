use image::{DynamicImage, GenericImageView};

use imgvec_core::traits::ImageDecoder;
use imgvec_core::{DecodeError, PixelBuffer};

/// Decodes an encoded raster into an interleaved RGB [`PixelBuffer`].
///
/// The format is sniffed from the payload. An alpha channel, if present, is
/// dropped and the remaining channels keep their source order. Grayscale is
/// expanded to three equal channels; deeper sample types are reduced to 8 bit.
pub fn decode_rgb(bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let img = image::load_from_memory(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    let (width, height) = img.dimensions();

    let samples = match img {
        DynamicImage::ImageRgb8(buf) => buf.into_raw(),
        DynamicImage::ImageRgba8(buf) => buf
            .into_raw()
            .chunks_exact(4)
            .flat_map(|px| px[..3].iter().copied())
            .collect(),
        other => other.to_rgb8().into_raw(),
    };

    PixelBuffer::from_raw(width as usize, height as usize, samples).ok_or_else(|| {
        DecodeError::Malformed(format!("decoded sample count does not match {width}x{height}x3"))
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PixelBuffer, DecodeError> {
        decode_rgb(bytes)
    }
}
