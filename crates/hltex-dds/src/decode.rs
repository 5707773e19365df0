//! Decoding pipeline: header check, pluggable block decoder, channel reorder.

use crate::header::{parse_header_with, Validation};
use crate::pixel::reorder_channels;
use crate::{Error, Result};

/// An uncompressed RGBA image as produced by a [`Decoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Row-major, top-down, four bytes per pixel in R, G, B, A order.
    pub data: Vec<u8>,
}

/// Final output of [`decode_to_bgra`]: a top-down BGRA raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    /// Four bytes per pixel in B, G, R, A order.
    pub pixels: Vec<u8>,
}

/// A block-decompression backend.
///
/// Implementations receive the whole DDS file and return its top-level image
/// as RGBA. Failures are reported in the backend's own error type and reach
/// callers unchanged inside [`Error::DecodeFailure`].
pub trait Decoder: Send + Sync {
    /// Backend-specific failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Decode a complete DDS file.
    fn decode(&self, bytes: &[u8]) -> std::result::Result<RasterImage, Self::Error>;
}

impl<D: Decoder + ?Sized> Decoder for &D {
    type Error = D::Error;

    fn decode(&self, bytes: &[u8]) -> std::result::Result<RasterImage, Self::Error> {
        (**self).decode(bytes)
    }
}

/// Decode a DDS file into a BGRA raster.
///
/// The header is validated before the decoder runs, so a file that is not a
/// DDS never reaches the backend.
pub fn decode_to_bgra<D: Decoder>(bytes: &[u8], decoder: &D) -> Result<Raster> {
    decode_to_bgra_with(bytes, decoder, Validation::Tolerant)
}

/// [`decode_to_bgra`] with an explicit header validation level.
pub fn decode_to_bgra_with<D: Decoder>(
    bytes: &[u8],
    decoder: &D,
    validation: Validation,
) -> Result<Raster> {
    let header = parse_header_with(bytes, validation)?;

    let image = decoder
        .decode(bytes)
        .map_err(|e| Error::DecodeFailure(Box::new(e)))?;

    if image.width != header.width() || image.height != header.height() {
        tracing::debug!(
            header_width = header.width(),
            header_height = header.height(),
            width = image.width,
            height = image.height,
            "decoder returned dimensions that differ from the header"
        );
    }

    let RasterImage {
        width,
        height,
        data: mut pixels,
    } = image;
    reorder_channels(&mut pixels, width, height)?;

    Ok(Raster {
        width,
        height,
        pixels,
    })
}
