//! Reference [`Decoder`] backed by `bcdec_rs`.

use thiserror::Error;

use crate::decode::{Decoder, RasterImage};
use crate::file::DdsFile;
use crate::format::{mip_level_size, Dx10Header, TextureFormat};
use crate::header::FourCC;
use crate::pixel::{pixel_buffer_len, reorder_channels};

// All BCn formats use 4x4 pixel blocks.
const BLOCK_DIM: usize = 4;
const BLOCK_PITCH: usize = BLOCK_DIM * 4;

/// Errors from [`BcnDecoder`].
#[derive(Debug, Error)]
pub enum BcnError {
    /// The headers could not be read.
    #[error("{0}")]
    Header(#[from] crate::Error),

    /// The payload format has no decoder here.
    #[error("unsupported texture format {0:?}")]
    Unsupported(TextureFormat),

    /// The payload ends before the top mip level does.
    #[error("payload too short: needed {needed} bytes, got {available}")]
    PayloadTooShort { needed: usize, available: usize },
}

/// Decodes the top mip level of BC1 through BC7 textures, and copies 32-bit
/// RGBA/BGRA payloads.
///
/// Channels missing from a codec are filled in for display: BC4 becomes grey
/// with opaque alpha, BC5 fills blue with zero, and BC6H is clamped to
/// `[0, 1]` before quantizing to 8 bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcnDecoder;

impl BcnDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for BcnDecoder {
    type Error = BcnError;

    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, BcnError> {
        let file = DdsFile::parse(bytes)?;
        let format = file.format();
        let (width, height) = (file.header().width(), file.header().height());

        let unsupported = || BcnError::Unsupported(format);
        let needed = match format {
            TextureFormat::Unknown => None,
            TextureFormat::Rgba8 | TextureFormat::Bgra8 => pixel_buffer_len(width, height),
            _ => mip_level_size(width, height, format),
        }
        .ok_or_else(unsupported)?;

        let payload = file.payload();
        if payload.len() < needed {
            return Err(BcnError::PayloadTooShort {
                needed,
                available: payload.len(),
            });
        }
        let payload = &payload[..needed];

        let data = match format {
            TextureFormat::Rgba8 => payload.to_vec(),
            TextureFormat::Bgra8 => {
                let mut data = payload.to_vec();
                reorder_channels(&mut data, width, height)?;
                data
            }
            TextureFormat::Unknown => return Err(unsupported()),
            _ => decode_blocks(
                payload,
                width as usize,
                height as usize,
                format,
                is_signed(&file),
            ),
        };

        tracing::debug!(width, height, ?format, "decoded top mip level");
        Ok(RasterImage { width, height, data })
    }
}

/// SNORM variants of BC4/BC5 and the signed BC6H float format.
fn is_signed(file: &DdsFile<'_>) -> bool {
    match file.dx10() {
        Some(dx10) => matches!(
            dx10.dxgi_format,
            Dx10Header::BC4_SNORM | Dx10Header::BC5_SNORM | Dx10Header::BC6H_SF16
        ),
        None => matches!(
            file.header().pixel_format().four_cc(),
            FourCC::BC4S | FourCC::BC5S
        ),
    }
}

/// Map a signed 8-bit channel in `[-127, 127]` onto `[0, 255]`.
fn snorm_to_unorm(value: u8, signed: bool) -> u8 {
    if !signed {
        return value;
    }
    let v = (value as i8).max(-127) as i32 + 127;
    ((v * 255 + 127) / 254) as u8
}

fn float_to_unorm(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Decode one block into a 4x4 RGBA tile with a pitch of [`BLOCK_PITCH`].
fn decode_block(
    block: &[u8],
    format: TextureFormat,
    signed: bool,
    out: &mut [u8; BLOCK_DIM * BLOCK_PITCH],
) {
    match format {
        TextureFormat::Bc1 => bcdec_rs::bc1(block, out, BLOCK_PITCH),
        TextureFormat::Bc2 => bcdec_rs::bc2(block, out, BLOCK_PITCH),
        TextureFormat::Bc3 => bcdec_rs::bc3(block, out, BLOCK_PITCH),
        TextureFormat::Bc4 => {
            let mut r = [0u8; BLOCK_DIM * BLOCK_DIM];
            bcdec_rs::bc4(block, &mut r, BLOCK_DIM, signed);
            for (px, &v) in out.chunks_exact_mut(4).zip(&r) {
                let v = snorm_to_unorm(v, signed);
                px.copy_from_slice(&[v, v, v, 255]);
            }
        }
        TextureFormat::Bc5 => {
            let mut rg = [0u8; BLOCK_DIM * BLOCK_DIM * 2];
            bcdec_rs::bc5(block, &mut rg, BLOCK_DIM * 2, signed);
            for (px, c) in out.chunks_exact_mut(4).zip(rg.chunks_exact(2)) {
                let (r, g) = (snorm_to_unorm(c[0], signed), snorm_to_unorm(c[1], signed));
                px.copy_from_slice(&[r, g, 0, 255]);
            }
        }
        TextureFormat::Bc6h => {
            let mut rgb = [0f32; BLOCK_DIM * BLOCK_DIM * 3];
            bcdec_rs::bc6h_float(block, &mut rgb, BLOCK_DIM * 3, signed);
            for (px, c) in out.chunks_exact_mut(4).zip(rgb.chunks_exact(3)) {
                let [r, g, b] = [c[0], c[1], c[2]].map(float_to_unorm);
                px.copy_from_slice(&[r, g, b, 255]);
            }
        }
        _ => bcdec_rs::bc7(block, out, BLOCK_PITCH),
    }
}

fn decode_blocks(
    data: &[u8],
    width: usize,
    height: usize,
    format: TextureFormat,
    signed: bool,
) -> Vec<u8> {
    let block_size = format.block_size().unwrap_or(16);
    let mut rgba = vec![0u8; pixel_buffer_len(width as u32, height as u32).unwrap_or(0)];
    let blocks_x = width.div_ceil(BLOCK_DIM).max(1);

    let mut block_rgba = [0u8; BLOCK_DIM * BLOCK_PITCH];
    for (index, block) in data.chunks_exact(block_size).enumerate() {
        decode_block(block, format, signed, &mut block_rgba);

        let (bx, by) = (index % blocks_x, index / blocks_x);
        for py in 0..BLOCK_DIM {
            let y = by * BLOCK_DIM + py;
            if y >= height {
                break;
            }
            let x0 = bx * BLOCK_DIM;
            let cols = BLOCK_DIM.min(width.saturating_sub(x0));
            let src = py * BLOCK_PITCH;
            let dst = (y * width + x0) * 4;
            rgba[dst..dst + cols * 4].copy_from_slice(&block_rgba[src..src + cols * 4]);
        }
    }

    rgba
}
