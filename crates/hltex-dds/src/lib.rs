//! DirectDraw Surface (DDS) header parsing and raster assembly.
//!
//! The pipeline is split in two halves around an external block decoder:
//!
//! - [`parse_header`] validates the magic and decodes the fixed 128-byte
//!   header into an immutable [`Header`].
//! - [`reorder_channels`] turns the decoder's RGBA output into BGRA.
//!
//! [`decode_to_bgra`] runs both with any [`Decoder`] in between. With the
//! `bcdec` feature, [`BcnDecoder`] provides one for BC1/BC2/BC3/BC7.
//!
//! # Example
//!
//! ```
//! use hltex_dds::{parse_header, reorder_channels, Error};
//!
//! assert!(matches!(parse_header(b"DDS "), Err(Error::TruncatedInput { .. })));
//!
//! let mut pixels = [10, 20, 30, 40, 50, 60, 70, 80];
//! reorder_channels(&mut pixels, 2, 1)?;
//! assert_eq!(pixels, [30, 20, 10, 40, 70, 60, 50, 80]);
//! # Ok::<(), Error>(())
//! ```

mod decode;
mod error;
mod file;
mod format;
mod header;
mod pixel;

#[cfg(feature = "bcdec")]
mod bcn;

pub use decode::{decode_to_bgra, decode_to_bgra_with, Decoder, Raster, RasterImage};
pub use error::{Error, Result};
pub use file::DdsFile;
pub use format::{mip_level_size, Dx10Header, TextureFormat};
pub use header::{
    parse_header, parse_header_with, ChannelMasks, FourCC, Header, PixelFormat, PixelLayout,
    Validation, HEADER_LEN,
};
pub use pixel::{pixel_buffer_len, reorder_channels, to_bgra};

#[cfg(feature = "bcdec")]
pub use bcn::{BcnDecoder, BcnError};

/// DDS file magic bytes ("DDS ").
pub const DDS_MAGIC: &[u8; 4] = b"DDS ";
