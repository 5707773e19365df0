//! Borrowed view over a complete DDS file.

use hltex_common::BinaryReader;

use crate::format::{mip_level_size, Dx10Header, TextureFormat};
use crate::header::{parse_header_with, Header, Validation, HEADER_LEN};
use crate::{Error, Result};

/// A parsed DDS file: headers plus the payload that follows them.
#[derive(Debug, Clone, Copy)]
pub struct DdsFile<'a> {
    header: Header,
    dx10: Option<Dx10Header>,
    payload: &'a [u8],
}

impl<'a> DdsFile<'a> {
    /// Parse a DDS file, tolerating non-standard declared sizes.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        Self::parse_with(bytes, Validation::Tolerant)
    }

    /// Parse a DDS file with an explicit validation level.
    pub fn parse_with(bytes: &'a [u8], validation: Validation) -> Result<Self> {
        let header = parse_header_with(bytes, validation)?;

        let mut reader = BinaryReader::new_at(bytes, HEADER_LEN);
        let dx10 = if header.is_dx10() {
            if reader.remaining() < Dx10Header::LEN {
                return Err(Error::TruncatedExtension {
                    needed: Dx10Header::LEN,
                    available: reader.remaining(),
                });
            }
            Some(Dx10Header::read(&mut reader)?)
        } else {
            None
        };

        Ok(Self {
            header,
            dx10,
            payload: reader.remaining_bytes(),
        })
    }

    /// The main header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The DX10 extension, if the FourCC announced one.
    pub fn dx10(&self) -> Option<&Dx10Header> {
        self.dx10.as_ref()
    }

    /// Offset of the first payload byte in the file.
    pub fn data_offset(&self) -> usize {
        HEADER_LEN + if self.dx10.is_some() { Dx10Header::LEN } else { 0 }
    }

    /// Pixel data following the headers.
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// The payload's pixel encoding.
    pub fn format(&self) -> TextureFormat {
        TextureFormat::resolve(self.header.layout(), self.dx10.as_ref())
    }

    /// Byte size of each mip level of the first surface, largest first.
    ///
    /// A `mipmap_count` of zero is treated as one level. Empty when the
    /// format is unknown.
    pub fn mip_sizes(&self) -> Vec<usize> {
        let format = self.format();
        let levels = self.header.mipmap_count().clamp(1, 32);

        (0..levels)
            .map_while(|i| {
                let width = (self.header.width() >> i).max(1);
                let height = (self.header.height() >> i).max(1);
                mip_level_size(width, height, format)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::tests::Fields;

    fn dx10_file(dxgi_format: u32) -> Vec<u8> {
        let mut bytes = Fields::new(8, 8, b"DX10").to_bytes();
        for v in [dxgi_format, 3, 0, 1, 0] {
            bytes.extend_from_slice(&u32::to_le_bytes(v));
        }
        bytes
    }

    #[test]
    fn test_legacy_payload_starts_at_128() {
        let mut bytes = Fields::new(4, 4, b"DXT1").to_bytes();
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

        let file = DdsFile::parse(&bytes).unwrap();
        assert!(file.dx10().is_none());
        assert_eq!(file.data_offset(), 128);
        assert_eq!(file.payload(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(file.format(), TextureFormat::Bc1);
    }

    #[test]
    fn test_dx10_extension_is_read() {
        let mut bytes = dx10_file(Dx10Header::BC7_UNORM);
        bytes.extend_from_slice(&[0xEE; 16 * 4]);

        let file = DdsFile::parse(&bytes).unwrap();
        let dx10 = file.dx10().unwrap();
        assert_eq!(dx10.dxgi_format, Dx10Header::BC7_UNORM);
        assert_eq!(dx10.resource_dimension, 3);
        assert_eq!(dx10.array_size, 1);
        assert_eq!(file.data_offset(), 148);
        assert_eq!(file.payload().len(), 64);
        assert_eq!(file.format(), TextureFormat::Bc7);
    }

    #[test]
    fn test_truncated_dx10_extension() {
        let bytes = dx10_file(Dx10Header::BC7_UNORM);
        assert!(matches!(
            DdsFile::parse(&bytes[..140]),
            Err(Error::TruncatedExtension { needed: 20, available: 12 })
        ));
    }

    #[test]
    fn test_mip_sizes() {
        let mut fields = Fields::new(16, 8, b"DXT5");
        fields.mipmaps = 5;
        let bytes = fields.to_bytes();

        let file = DdsFile::parse(&bytes).unwrap();
        assert_eq!(file.mip_sizes(), vec![128, 32, 16, 16, 16]);

        let mut fields = Fields::new(16, 8, b"DXT5");
        fields.mipmaps = 0;
        let bytes = fields.to_bytes();
        assert_eq!(DdsFile::parse(&bytes).unwrap().mip_sizes(), vec![128]);
    }

    #[test]
    fn test_unknown_format_has_no_mip_sizes() {
        let bytes = Fields::new(16, 8, b"NVTT").to_bytes();
        let file = DdsFile::parse(&bytes).unwrap();
        assert_eq!(file.format(), TextureFormat::Unknown);
        assert!(file.mip_sizes().is_empty());
    }
}
