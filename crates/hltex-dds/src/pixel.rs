//! RGBA to BGRA channel reordering.

use crate::{Error, Result};

const CHANNELS: usize = 4;

/// Byte length of a `width` x `height` four-channel raster, if it fits in `usize`.
pub fn pixel_buffer_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(CHANNELS)
}

fn check_len(buffer: &[u8], width: u32, height: u32) -> Result<()> {
    if pixel_buffer_len(width, height) != Some(buffer.len()) {
        return Err(Error::SizeMismatch {
            width,
            height,
            actual: buffer.len(),
        });
    }
    Ok(())
}

/// Swap the red and blue bytes of every pixel in place.
///
/// Green and alpha are left untouched, so applying this twice restores the
/// original buffer. The buffer must be exactly `width * height * 4` bytes.
pub fn reorder_channels(buffer: &mut [u8], width: u32, height: u32) -> Result<()> {
    check_len(buffer, width, height)?;

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;

        let row_len = width as usize * CHANNELS;
        if row_len > 0 {
            buffer
                .par_chunks_mut(row_len)
                .for_each(|row| row.chunks_exact_mut(CHANNELS).for_each(|px| px.swap(0, 2)));
        }
    }

    #[cfg(not(feature = "rayon"))]
    {
        for px in buffer.chunks_exact_mut(CHANNELS) {
            px.swap(0, 2);
        }
    }

    tracing::trace!(width, height, "reordered RGBA to BGRA");
    Ok(())
}

/// Copying variant of [`reorder_channels`].
pub fn to_bgra(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    check_len(rgba, width, height)?;
    let mut out = rgba.to_vec();
    reorder_channels(&mut out, width, height)?;
    Ok(out)
}
