//! DDS header structures and parsing.
//!
//! The on-disk header is 128 bytes: the `"DDS "` magic followed by the
//! 124-byte `DDS_HEADER`, which embeds the 32-byte `DDS_PIXELFORMAT`. Every
//! field is a little-endian u32 at a fixed offset.

use std::fmt;

use hltex_common::BinaryReader;
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{Error, Result, DDS_MAGIC};

/// Total size of magic plus header.
pub const HEADER_LEN: usize = 128;

/// Raw `DDS_PIXELFORMAT` as laid out on disk.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawPixelFormat {
    size: U32,
    flags: U32,
    four_cc: [u8; 4],
    rgb_bit_count: U32,
    r_bit_mask: U32,
    g_bit_mask: U32,
    b_bit_mask: U32,
    a_bit_mask: U32,
}

/// Raw `DDS_HEADER` as laid out on disk, following the magic.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawHeader {
    size: U32,
    flags: U32,
    height: U32,
    width: U32,
    pitch_or_linear_size: U32,
    depth: U32,
    mipmap_count: U32,
    reserved1: [U32; 11],
    pixel_format: RawPixelFormat,
    caps: U32,
    caps2: U32,
    caps3: U32,
    caps4: U32,
    reserved2: U32,
}

const _: () = assert!(std::mem::size_of::<RawPixelFormat>() == PixelFormat::SIZE as usize);
const _: () = assert!(std::mem::size_of::<RawHeader>() == Header::SIZE as usize);

/// How much structural validation [`parse_header_with`] performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validation {
    /// Accept any declared `size` fields and store them as-is.
    #[default]
    Tolerant,
    /// Reject headers whose declared sizes are not 124 and 32.
    Strict,
}

/// Four-character code identifying the pixel codec.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// DXT1 compression (BC1).
    pub const DXT1: Self = Self(*b"DXT1");
    /// DXT2 compression (BC2, premultiplied).
    pub const DXT2: Self = Self(*b"DXT2");
    /// DXT3 compression (BC2).
    pub const DXT3: Self = Self(*b"DXT3");
    /// DXT4 compression (BC3, premultiplied).
    pub const DXT4: Self = Self(*b"DXT4");
    /// DXT5 compression (BC3).
    pub const DXT5: Self = Self(*b"DXT5");
    /// DX10 extended header.
    pub const DX10: Self = Self(*b"DX10");
    /// ATI1 compression (BC4).
    pub const ATI1: Self = Self(*b"ATI1");
    /// ATI2 compression (BC5).
    pub const ATI2: Self = Self(*b"ATI2");
    /// BC4U compression.
    pub const BC4U: Self = Self(*b"BC4U");
    /// BC4S compression.
    pub const BC4S: Self = Self(*b"BC4S");
    /// BC5U compression.
    pub const BC5U: Self = Self(*b"BC5U");
    /// BC5S compression.
    pub const BC5S: Self = Self(*b"BC5S");

    /// The raw bytes as stored in the file.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// The bytes with trailing NULs removed.
    pub fn trimmed(&self) -> &[u8] {
        let end = self.0.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        &self.0[..end]
    }

    /// True when no codec is named (all NUL), i.e. an uncompressed layout.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.trimmed().is_empty()
    }
}

impl fmt::Display for FourCC {
    /// Trailing NULs are dropped; anything outside printable ASCII shows as `?`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;

        for &b in self.trimmed() {
            let c = if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            };
            f.write_char(c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCC({:?})", self.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for FourCC {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Bit masks of an uncompressed pixel layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ChannelMasks {
    pub r: u32,
    pub g: u32,
    pub b: u32,
    pub a: u32,
}

/// What the pixel format says about the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum PixelLayout {
    /// No FourCC: pixels are described by a bit count and channel masks.
    Uncompressed { rgb_bit_count: u32, masks: ChannelMasks },
    /// A block-compressed codec named directly by the FourCC.
    LegacyCompressed { four_cc: FourCC },
    /// FourCC `DX10`: the format lives in the extension header after byte 128.
    Extended,
}

/// DDS pixel format (`DDS_PIXELFORMAT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PixelFormat {
    size: u32,
    flags: u32,
    four_cc: FourCC,
    rgb_bit_count: u32,
    masks: ChannelMasks,
}

impl PixelFormat {
    /// Expected structure size.
    pub const SIZE: u32 = 32;

    /// Declared structure size (should be 32).
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Pixel format flags.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Four-character code for compression.
    pub fn four_cc(&self) -> FourCC {
        self.four_cc
    }

    /// Number of bits per pixel (for uncompressed).
    pub fn rgb_bit_count(&self) -> u32 {
        self.rgb_bit_count
    }

    /// Red, green, blue and alpha bit masks.
    pub fn masks(&self) -> ChannelMasks {
        self.masks
    }

    /// Classify the format by its FourCC.
    pub fn layout(&self) -> PixelLayout {
        if self.four_cc == FourCC::DX10 {
            PixelLayout::Extended
        } else if self.four_cc.is_empty() {
            PixelLayout::Uncompressed {
                rgb_bit_count: self.rgb_bit_count,
                masks: self.masks,
            }
        } else {
            PixelLayout::LegacyCompressed {
                four_cc: self.four_cc,
            }
        }
    }

    fn from_raw(raw: &RawPixelFormat) -> Self {
        Self {
            size: raw.size.get(),
            flags: raw.flags.get(),
            four_cc: FourCC(raw.four_cc),
            rgb_bit_count: raw.rgb_bit_count.get(),
            masks: ChannelMasks {
                r: raw.r_bit_mask.get(),
                g: raw.g_bit_mask.get(),
                b: raw.b_bit_mask.get(),
                a: raw.a_bit_mask.get(),
            },
        }
    }

    fn to_raw(self) -> RawPixelFormat {
        RawPixelFormat {
            size: U32::new(self.size),
            flags: U32::new(self.flags),
            four_cc: self.four_cc.0,
            rgb_bit_count: U32::new(self.rgb_bit_count),
            r_bit_mask: U32::new(self.masks.r),
            g_bit_mask: U32::new(self.masks.g),
            b_bit_mask: U32::new(self.masks.b),
            a_bit_mask: U32::new(self.masks.a),
        }
    }
}

/// DDS file header.
///
/// Built once by [`parse_header`] and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Header {
    size: u32,
    flags: u32,
    height: u32,
    width: u32,
    pitch_or_linear_size: u32,
    depth: u32,
    mipmap_count: u32,
    reserved1: [u32; 11],
    pixel_format: PixelFormat,
    caps: u32,
    caps2: u32,
    caps3: u32,
    caps4: u32,
    reserved2: u32,
}

impl Header {
    /// Expected header size.
    pub const SIZE: u32 = 124;

    /// Declared header size (should be 124).
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Header flags.
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Image height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Image width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pitch or linear size.
    pub fn pitch_or_linear_size(&self) -> u32 {
        self.pitch_or_linear_size
    }

    /// Depth (for volume textures).
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of mipmap levels.
    pub fn mipmap_count(&self) -> u32 {
        self.mipmap_count
    }

    /// Reserved words, passed through untouched.
    pub fn reserved1(&self) -> &[u32; 11] {
        &self.reserved1
    }

    /// Pixel format.
    pub fn pixel_format(&self) -> &PixelFormat {
        &self.pixel_format
    }

    /// Surface capabilities.
    pub fn caps(&self) -> u32 {
        self.caps
    }

    /// Surface capabilities 2 (cubemap and volume flags).
    pub fn caps2(&self) -> u32 {
        self.caps2
    }

    /// Surface capabilities 3.
    pub fn caps3(&self) -> u32 {
        self.caps3
    }

    /// Surface capabilities 4.
    pub fn caps4(&self) -> u32 {
        self.caps4
    }

    /// Reserved.
    pub fn reserved2(&self) -> u32 {
        self.reserved2
    }

    /// Check if this is a DX10 extended header.
    #[inline]
    pub fn is_dx10(&self) -> bool {
        self.pixel_format.four_cc == FourCC::DX10
    }

    /// Tagged view of the pixel format.
    pub fn layout(&self) -> PixelLayout {
        self.pixel_format.layout()
    }

    /// Check the declared structure sizes.
    ///
    /// [`Validation::Tolerant`] always succeeds.
    pub fn validate(&self, validation: Validation) -> Result<()> {
        if validation == Validation::Tolerant {
            return Ok(());
        }
        if self.size != Self::SIZE {
            return Err(Error::InvalidFieldSize {
                field: "header size",
                expected: Self::SIZE,
                actual: self.size,
            });
        }
        if self.pixel_format.size != PixelFormat::SIZE {
            return Err(Error::InvalidFieldSize {
                field: "pixel format size",
                expected: PixelFormat::SIZE,
                actual: self.pixel_format.size,
            });
        }
        Ok(())
    }

    /// Encode the magic and header back into their 128-byte on-disk form.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(DDS_MAGIC);
        out[4..].copy_from_slice(self.to_raw().as_bytes());
        out
    }

    fn from_raw(raw: &RawHeader) -> Self {
        Self {
            size: raw.size.get(),
            flags: raw.flags.get(),
            height: raw.height.get(),
            width: raw.width.get(),
            pitch_or_linear_size: raw.pitch_or_linear_size.get(),
            depth: raw.depth.get(),
            mipmap_count: raw.mipmap_count.get(),
            reserved1: raw.reserved1.map(|v| v.get()),
            pixel_format: PixelFormat::from_raw(&raw.pixel_format),
            caps: raw.caps.get(),
            caps2: raw.caps2.get(),
            caps3: raw.caps3.get(),
            caps4: raw.caps4.get(),
            reserved2: raw.reserved2.get(),
        }
    }

    fn to_raw(self) -> RawHeader {
        RawHeader {
            size: U32::new(self.size),
            flags: U32::new(self.flags),
            height: U32::new(self.height),
            width: U32::new(self.width),
            pitch_or_linear_size: U32::new(self.pitch_or_linear_size),
            depth: U32::new(self.depth),
            mipmap_count: U32::new(self.mipmap_count),
            reserved1: self.reserved1.map(U32::new),
            pixel_format: self.pixel_format.to_raw(),
            caps: U32::new(self.caps),
            caps2: U32::new(self.caps2),
            caps3: U32::new(self.caps3),
            caps4: U32::new(self.caps4),
            reserved2: U32::new(self.reserved2),
        }
    }
}

/// Parse the 128-byte DDS header at the start of `bytes`, tolerating any
/// declared structure sizes.
///
/// # Errors
///
/// - [`Error::TruncatedInput`] if fewer than 128 bytes are supplied.
/// - [`Error::BadMagic`] if the file does not start with `"DDS "`.
pub fn parse_header(bytes: &[u8]) -> Result<Header> {
    parse_header_with(bytes, Validation::Tolerant)
}

/// Parse the DDS header with an explicit validation level.
pub fn parse_header_with(bytes: &[u8], validation: Validation) -> Result<Header> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::TruncatedInput {
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }

    let mut reader = BinaryReader::new(bytes);
    let magic: [u8; 4] = reader.read_array()?;
    if &magic != DDS_MAGIC {
        return Err(Error::BadMagic(magic));
    }

    let raw: RawHeader = reader.read_struct()?;
    let header = Header::from_raw(&raw);
    header.validate(validation)?;

    tracing::debug!(
        width = header.width,
        height = header.height,
        mipmaps = header.mipmap_count,
        four_cc = %header.pixel_format.four_cc,
        "parsed DDS header"
    );

    Ok(header)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Field values for a synthetic header, written at their documented offsets.
    #[derive(Debug, Clone)]
    pub(crate) struct Fields {
        pub size: u32,
        pub flags: u32,
        pub height: u32,
        pub width: u32,
        pub pitch: u32,
        pub depth: u32,
        pub mipmaps: u32,
        pub reserved1: [u32; 11],
        pub pf_size: u32,
        pub pf_flags: u32,
        pub four_cc: [u8; 4],
        pub bit_count: u32,
        pub masks: [u32; 4],
        pub caps: [u32; 4],
        pub reserved2: u32,
    }

    impl Fields {
        pub(crate) fn new(width: u32, height: u32, four_cc: &[u8; 4]) -> Self {
            Self {
                size: 124,
                flags: 0x0008_1007,
                height,
                width,
                pitch: 0,
                depth: 0,
                mipmaps: 1,
                reserved1: [0; 11],
                pf_size: 32,
                pf_flags: 0x4,
                four_cc: *four_cc,
                bit_count: 0,
                masks: [0; 4],
                caps: [0x1000, 0, 0, 0],
                reserved2: 0,
            }
        }

        pub(crate) fn to_bytes(&self) -> Vec<u8> {
            fn put(buf: &mut [u8], offset: usize, value: u32) {
                buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
            }

            let mut buf = vec![0u8; HEADER_LEN];
            buf[0..4].copy_from_slice(b"DDS ");
            put(&mut buf, 4, self.size);
            put(&mut buf, 8, self.flags);
            put(&mut buf, 12, self.height);
            put(&mut buf, 16, self.width);
            put(&mut buf, 20, self.pitch);
            put(&mut buf, 24, self.depth);
            put(&mut buf, 28, self.mipmaps);
            for (i, v) in self.reserved1.iter().enumerate() {
                put(&mut buf, 32 + i * 4, *v);
            }
            put(&mut buf, 76, self.pf_size);
            put(&mut buf, 80, self.pf_flags);
            buf[84..88].copy_from_slice(&self.four_cc);
            put(&mut buf, 88, self.bit_count);
            for (i, v) in self.masks.iter().enumerate() {
                put(&mut buf, 92 + i * 4, *v);
            }
            for (i, v) in self.caps.iter().enumerate() {
                put(&mut buf, 108 + i * 4, *v);
            }
            put(&mut buf, 124, self.reserved2);
            buf
        }
    }

    #[test]
    fn test_parse_dxt1_header() {
        let bytes = Fields::new(4, 4, b"DXT1").to_bytes();
        let header = parse_header(&bytes).unwrap();

        assert_eq!(header.width(), 4);
        assert_eq!(header.height(), 4);
        assert!(!header.is_dx10());
        assert_eq!(header.pixel_format().four_cc().to_string(), "DXT1");
        assert_eq!(
            header.layout(),
            PixelLayout::LegacyCompressed { four_cc: FourCC::DXT1 }
        );
    }

    #[test]
    fn test_parse_dx10_header() {
        let bytes = Fields::new(16, 8, &[0x44, 0x58, 0x31, 0x30]).to_bytes();
        let header = parse_header(&bytes).unwrap();

        assert!(header.is_dx10());
        assert_eq!(header.layout(), PixelLayout::Extended);
    }

    #[test]
    fn test_partial_dx10_is_not_dx10() {
        let bytes = Fields::new(16, 8, b"DX1\0").to_bytes();
        let header = parse_header(&bytes).unwrap();

        assert!(!header.is_dx10());
        assert_eq!(header.pixel_format().four_cc().to_string(), "DX1");
    }

    #[test]
    fn test_every_field_lands_at_its_offset() {
        let mut fields = Fields::new(640, 480, b"DXT5");
        fields.flags = 0xA;
        fields.pitch = 0xB;
        fields.depth = 0xC;
        fields.mipmaps = 0xD;
        fields.reserved1 = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
        fields.pf_flags = 0xE;
        fields.bit_count = 0xF;
        fields.masks = [0x10, 0x11, 0x12, 0x13];
        fields.caps = [0x14, 0x15, 0x16, 0x17];
        fields.reserved2 = 0x18;

        let header = parse_header(&fields.to_bytes()).unwrap();
        assert_eq!(header.flags(), 0xA);
        assert_eq!(header.height(), 480);
        assert_eq!(header.width(), 640);
        assert_eq!(header.pitch_or_linear_size(), 0xB);
        assert_eq!(header.depth(), 0xC);
        assert_eq!(header.mipmap_count(), 0xD);
        assert_eq!(header.reserved1(), &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(header.pixel_format().size(), 32);
        assert_eq!(header.pixel_format().flags(), 0xE);
        assert_eq!(header.pixel_format().rgb_bit_count(), 0xF);
        assert_eq!(
            header.pixel_format().masks(),
            ChannelMasks { r: 0x10, g: 0x11, b: 0x12, a: 0x13 }
        );
        assert_eq!(header.caps(), 0x14);
        assert_eq!(header.caps2(), 0x15);
        assert_eq!(header.caps3(), 0x16);
        assert_eq!(header.caps4(), 0x17);
        assert_eq!(header.reserved2(), 0x18);
    }

    #[test]
    fn test_uncompressed_layout() {
        let mut fields = Fields::new(2, 2, &[0; 4]);
        fields.pf_flags = 0x41;
        fields.bit_count = 32;
        fields.masks = [0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000];

        let header = parse_header(&fields.to_bytes()).unwrap();
        assert!(header.pixel_format().four_cc().is_empty());
        assert_eq!(
            header.layout(),
            PixelLayout::Uncompressed {
                rgb_bit_count: 32,
                masks: ChannelMasks {
                    r: 0xFF,
                    g: 0xFF00,
                    b: 0xFF_0000,
                    a: 0xFF00_0000
                },
            }
        );
    }

    #[test]
    fn test_truncated_input() {
        let bytes = Fields::new(4, 4, b"DXT1").to_bytes();
        assert!(matches!(
            parse_header(&bytes[..127]),
            Err(Error::TruncatedInput { needed: 128, available: 127 })
        ));
        assert!(matches!(
            parse_header(&[]),
            Err(Error::TruncatedInput { available: 0, .. })
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = Fields::new(4, 4, b"DXT1").to_bytes();
        bytes[3] = 0;
        assert!(matches!(parse_header(&bytes), Err(Error::BadMagic(m)) if m == *b"DDS\0"));
    }

    #[test]
    fn test_tolerant_accepts_odd_sizes() {
        let mut fields = Fields::new(4, 4, b"DXT1");
        fields.size = 100;
        fields.pf_size = 0;
        let bytes = fields.to_bytes();

        let header = parse_header(&bytes).unwrap();
        assert_eq!(header.size(), 100);
        assert_eq!(header.pixel_format().size(), 0);

        assert!(matches!(
            parse_header_with(&bytes, Validation::Strict),
            Err(Error::InvalidFieldSize { field: "header size", expected: 124, actual: 100 })
        ));
    }

    #[test]
    fn test_strict_checks_pixel_format_size() {
        let mut fields = Fields::new(4, 4, b"DXT1");
        fields.pf_size = 24;
        let header = parse_header(&fields.to_bytes()).unwrap();

        assert!(header.validate(Validation::Tolerant).is_ok());
        assert!(matches!(
            header.validate(Validation::Strict),
            Err(Error::InvalidFieldSize { expected: 32, actual: 24, .. })
        ));

        let strict = parse_header_with(&Fields::new(4, 4, b"DXT1").to_bytes(), Validation::Strict);
        assert!(strict.is_ok());
    }

    #[test]
    fn test_fourcc_display_never_panics() {
        assert_eq!(FourCC([0xFF, b'A', 0x01, 0]).to_string(), "?A?");
        assert_eq!(FourCC([0; 4]).to_string(), "");
        assert_eq!(FourCC([0, b'X', 0, 0]).to_string(), "?X");
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mut bytes = Fields::new(8, 8, b"DXT5").to_bytes();
        bytes.extend_from_slice(&[0xAB; 64]);
        let header = parse_header(&bytes).unwrap();

        let encoded = header.to_bytes();
        assert_eq!(encoded.as_slice(), &bytes[..HEADER_LEN]);
    }

    proptest! {
        #[test]
        fn short_input_is_truncated(bytes in proptest::collection::vec(any::<u8>(), 0..HEADER_LEN)) {
            let is_truncated = matches!(parse_header(&bytes), Err(Error::TruncatedInput { .. }));
            prop_assert!(is_truncated);
        }

        #[test]
        fn wrong_magic_is_rejected(
            magic in any::<[u8; 4]>().prop_filter("not DDS magic", |m| m != b"DDS "),
            rest in proptest::collection::vec(any::<u8>(), HEADER_LEN - 4..=HEADER_LEN + 16),
        ) {
            let mut bytes = magic.to_vec();
            bytes.extend_from_slice(&rest);
            let is_bad_magic = matches!(parse_header(&bytes), Err(Error::BadMagic(m)) if m == magic);
            prop_assert!(is_bad_magic);
        }

        #[test]
        fn header_round_trips(body in proptest::collection::vec(any::<u8>(), HEADER_LEN - 4)) {
            let mut bytes = b"DDS ".to_vec();
            bytes.extend_from_slice(&body);

            let header = parse_header(&bytes).unwrap();
            let encoded = header.to_bytes();
            prop_assert_eq!(encoded.as_slice(), bytes.as_slice());
            prop_assert_eq!(parse_header(&encoded).unwrap(), header);
        }

        #[test]
        fn dx10_iff_fourcc_bytes_match(four_cc in any::<[u8; 4]>()) {
            let bytes = Fields::new(4, 4, &four_cc).to_bytes();
            let header = parse_header(&bytes).unwrap();
            prop_assert_eq!(header.is_dx10(), &four_cc == b"DX10");
            prop_assert!(header.pixel_format().four_cc().to_string().len() <= 4);
        }
    }
}
