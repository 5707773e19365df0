//! Common utilities for hltex.
//!
//! - [`BinaryReader`] - bounds-checked little-endian reading from byte slices
//! - [`Error`] - reading past the end of a buffer

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};
