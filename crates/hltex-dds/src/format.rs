//! DX10 extension header and texture format identification.

use hltex_common::BinaryReader;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::header::{ChannelMasks, FourCC, PixelLayout};
use crate::Result;

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawDx10Header {
    dxgi_format: U32,
    resource_dimension: U32,
    misc_flag: U32,
    array_size: U32,
    misc_flags2: U32,
}

/// DX10 extended header (`DDS_HEADER_DXT10`), present after the main header
/// when the FourCC is `DX10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Dx10Header {
    /// DXGI format.
    pub dxgi_format: u32,
    /// Resource dimension.
    pub resource_dimension: u32,
    /// Misc flags.
    pub misc_flag: u32,
    /// Array size.
    pub array_size: u32,
    /// Misc flags 2.
    pub misc_flags2: u32,
}

impl Dx10Header {
    /// Size of the extension on disk.
    pub const LEN: usize = 20;

    pub const R8G8B8A8_UNORM: u32 = 28;
    pub const R8G8B8A8_UNORM_SRGB: u32 = 29;
    pub const BC1_UNORM: u32 = 71;
    pub const BC1_UNORM_SRGB: u32 = 72;
    pub const BC2_UNORM: u32 = 74;
    pub const BC2_UNORM_SRGB: u32 = 75;
    pub const BC3_UNORM: u32 = 77;
    pub const BC3_UNORM_SRGB: u32 = 78;
    pub const BC4_UNORM: u32 = 80;
    pub const BC4_SNORM: u32 = 81;
    pub const BC5_UNORM: u32 = 83;
    pub const BC5_SNORM: u32 = 84;
    pub const B8G8R8A8_UNORM: u32 = 87;
    pub const B8G8R8A8_UNORM_SRGB: u32 = 91;
    pub const BC6H_UF16: u32 = 95;
    pub const BC6H_SF16: u32 = 96;
    pub const BC7_UNORM: u32 = 98;
    pub const BC7_UNORM_SRGB: u32 = 99;

    pub(crate) fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let raw: RawDx10Header = reader.read_struct()?;
        Ok(Self {
            dxgi_format: raw.dxgi_format.get(),
            resource_dimension: raw.resource_dimension.get(),
            misc_flag: raw.misc_flag.get(),
            array_size: raw.array_size.get(),
            misc_flags2: raw.misc_flags2.get(),
        })
    }
}

/// Pixel encoding of a DDS payload, resolved from the legacy pixel format or
/// the DX10 DXGI code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TextureFormat {
    Bc1,
    Bc2,
    Bc3,
    Bc4,
    Bc5,
    Bc6h,
    Bc7,
    /// 32-bit, bytes in R, G, B, A order.
    Rgba8,
    /// 32-bit, bytes in B, G, R, A order.
    Bgra8,
    Unknown,
}

impl TextureFormat {
    const RGBA8_MASKS: ChannelMasks = ChannelMasks {
        r: 0x0000_00FF,
        g: 0x0000_FF00,
        b: 0x00FF_0000,
        a: 0xFF00_0000,
    };
    const BGRA8_MASKS: ChannelMasks = ChannelMasks {
        r: 0x00FF_0000,
        g: 0x0000_FF00,
        b: 0x0000_00FF,
        a: 0xFF00_0000,
    };

    /// Resolve the format from a header layout and, for `Extended`, the DX10 block.
    pub fn resolve(layout: PixelLayout, dx10: Option<&Dx10Header>) -> Self {
        match layout {
            PixelLayout::LegacyCompressed { four_cc } => Self::from_four_cc(four_cc),
            PixelLayout::Extended => dx10.map_or(Self::Unknown, |h| Self::from_dxgi(h.dxgi_format)),
            PixelLayout::Uncompressed { rgb_bit_count: 32, masks } => {
                if masks == Self::RGBA8_MASKS {
                    Self::Rgba8
                } else if masks == Self::BGRA8_MASKS {
                    Self::Bgra8
                } else {
                    Self::Unknown
                }
            }
            PixelLayout::Uncompressed { .. } => Self::Unknown,
        }
    }

    fn from_four_cc(four_cc: FourCC) -> Self {
        match four_cc {
            FourCC::DXT1 => Self::Bc1,
            FourCC::DXT2 | FourCC::DXT3 => Self::Bc2,
            FourCC::DXT4 | FourCC::DXT5 => Self::Bc3,
            FourCC::ATI1 | FourCC::BC4U | FourCC::BC4S => Self::Bc4,
            FourCC::ATI2 | FourCC::BC5U | FourCC::BC5S => Self::Bc5,
            _ => Self::Unknown,
        }
    }

    fn from_dxgi(format: u32) -> Self {
        match format {
            Dx10Header::BC1_UNORM | Dx10Header::BC1_UNORM_SRGB => Self::Bc1,
            Dx10Header::BC2_UNORM | Dx10Header::BC2_UNORM_SRGB => Self::Bc2,
            Dx10Header::BC3_UNORM | Dx10Header::BC3_UNORM_SRGB => Self::Bc3,
            Dx10Header::BC4_UNORM | Dx10Header::BC4_SNORM => Self::Bc4,
            Dx10Header::BC5_UNORM | Dx10Header::BC5_SNORM => Self::Bc5,
            Dx10Header::BC6H_UF16 | Dx10Header::BC6H_SF16 => Self::Bc6h,
            Dx10Header::BC7_UNORM | Dx10Header::BC7_UNORM_SRGB => Self::Bc7,
            Dx10Header::R8G8B8A8_UNORM | Dx10Header::R8G8B8A8_UNORM_SRGB => Self::Rgba8,
            Dx10Header::B8G8R8A8_UNORM | Dx10Header::B8G8R8A8_UNORM_SRGB => Self::Bgra8,
            _ => Self::Unknown,
        }
    }

    /// True for the 4x4 block-compressed formats.
    pub fn is_block_compressed(self) -> bool {
        !matches!(self, Self::Rgba8 | Self::Bgra8 | Self::Unknown)
    }

    /// Bytes per 4x4 block, or per pixel for uncompressed formats.
    ///
    /// `None` for [`TextureFormat::Unknown`].
    pub fn block_size(self) -> Option<usize> {
        match self {
            // BC4 and BC1 use 8 bytes per block, others use 16
            Self::Bc1 | Self::Bc4 => Some(8),
            Self::Bc2 | Self::Bc3 | Self::Bc5 | Self::Bc6h | Self::Bc7 => Some(16),
            Self::Rgba8 | Self::Bgra8 => Some(4),
            Self::Unknown => None,
        }
    }
}

/// Size in bytes of one mip level of `width` x `height` pixels.
pub fn mip_level_size(width: u32, height: u32, format: TextureFormat) -> Option<usize> {
    let unit = format.block_size()?;
    let (w, h) = (width.max(1) as usize, height.max(1) as usize);
    if format.is_block_compressed() {
        w.div_ceil(4).checked_mul(h.div_ceil(4))?.checked_mul(unit)
    } else {
        w.checked_mul(h)?.checked_mul(unit)
    }
}
