//! Error types for DDS handling.

use thiserror::Error;

/// Errors that can occur when working with DDS files.
#[derive(Debug, Error)]
pub enum Error {
    /// Fewer bytes than a DDS header needs.
    #[error("input too short for a DDS header: needed {needed} bytes, got {available}")]
    TruncatedInput { needed: usize, available: usize },

    /// Invalid DDS magic.
    #[error("not a DDS file: expected magic 'DDS ', got {0:?}")]
    BadMagic([u8; 4]),

    /// A declared structure size disagrees with the format (strict validation only).
    #[error("invalid {field}: expected {expected}, got {actual}")]
    InvalidFieldSize {
        field: &'static str,
        expected: u32,
        actual: u32,
    },

    /// FourCC says DX10 but the extension header is cut off.
    #[error("DX10 extension header truncated: needed {needed} bytes, got {available}")]
    TruncatedExtension { needed: usize, available: usize },

    /// Pixel buffer length does not match `width * height * 4`.
    #[error("pixel buffer of {actual} bytes does not match {width}x{height} RGBA")]
    SizeMismatch { width: u32, height: u32, actual: usize },

    /// The decoding backend failed; the source is its own error, unchanged.
    #[error("failed to decode DDS payload: {0}")]
    DecodeFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] hltex_common::Error),
}

/// Result type for DDS operations.
pub type Result<T> = std::result::Result<T, Error>;
