//! imgvec-image
//!
//! Everything between a URL and a model-ready tensor: the HTTP fetcher, the
//! raster decoder and the bilinear preprocessor.

pub mod decode;
pub mod fetch;
pub mod preprocess;

pub use decode::{decode_rgb, RasterDecoder};
pub use fetch::HttpFetcher;
pub use preprocess::{preprocess, resize_bilinear};
