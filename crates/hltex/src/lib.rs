//! hltex - texture tooling library.
//!
//! This crate provides a unified interface to the hltex crates.
//!
//! # Crates
//!
//! - [`hltex_common`] - Common utilities (bounds-checked binary reading)
//! - [`hltex_dds`] - DDS header parsing, pluggable decoding and BGRA assembly
//!
//! # Example
//!
//! ```no_run
//! use hltex::prelude::*;
//!
//! let bytes = std::fs::read("texture.dds")?;
//! let file = DdsFile::parse(&bytes)?;
//! println!("{}x{} {:?}", file.header().width(), file.header().height(), file.format());
//!
//! let raster = decode_to_bgra(&bytes, &BcnDecoder::new())?;
//! assert_eq!(raster.pixels.len(), (raster.width * raster.height * 4) as usize);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use hltex_common as common;
pub use hltex_dds as dds;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use hltex_common::BinaryReader;
    #[cfg(feature = "full")]
    pub use hltex_dds::BcnDecoder;
    pub use hltex_dds::{
        decode_to_bgra, decode_to_bgra_with, parse_header, parse_header_with, reorder_channels,
        DdsFile, Decoder, FourCC, Header, PixelLayout, Raster, RasterImage, TextureFormat,
        Validation,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
