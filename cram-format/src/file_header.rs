//! The fixed 26-byte CRAM file header.

use cram_core::error::{CramError, Result};
use std::io::Read;

/// Magic bytes that open every CRAM stream.
pub const CRAM_MAGIC: [u8; 4] = *b"CRAM";

/// Width in bytes of the free-form id field.
const ID_FIELD_LEN: usize = 20;

/// The fixed-width preamble: 4-byte magic, major/minor version, 20-byte id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Major format version.
    pub major_version: u8,
    /// Minor format version.
    pub minor_version: u8,
    /// Free-form identifier, zero-padded; stored without trailing zero bytes.
    pub id: Vec<u8>,
}

impl FileHeader {
    /// Read and validate the 26-byte header.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(|_| CramError::truncated_stream(0))?;
        if magic != CRAM_MAGIC {
            return Err(CramError::malformed_stream(format!(
                "bad CRAM magic: {magic:?}"
            )));
        }

        let mut version = [0u8; 2];
        reader
            .read_exact(&mut version)
            .map_err(|_| CramError::truncated_stream(32))?;

        let mut id = vec![0u8; ID_FIELD_LEN];
        reader
            .read_exact(&mut id)
            .map_err(|_| CramError::truncated_stream(48))?;
        while id.last() == Some(&0) {
            id.pop();
        }

        Ok(Self {
            major_version: version[0],
            minor_version: version[1],
            id,
        })
    }

    /// Whether this implementation claims to support the given major/minor.
    pub fn is_supported_version(&self) -> bool {
        self.major_version == 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_header_bytes() -> Vec<u8> {
        let mut buf = CRAM_MAGIC.to_vec();
        buf.push(3);
        buf.push(0);
        buf.extend(std::iter::repeat_n(0u8, ID_FIELD_LEN));
        buf
    }

    #[test]
    fn parses_version_and_strips_id_padding() {
        let header = FileHeader::read(&mut Cursor::new(sample_header_bytes())).unwrap();
        assert_eq!(header.major_version, 3);
        assert_eq!(header.minor_version, 0);
        assert!(header.id.is_empty());
        assert!(header.is_supported_version());
    }

    #[test]
    fn bad_magic_is_malformed_stream() {
        let mut buf = b"GZIP".to_vec();
        buf.extend(std::iter::repeat_n(0u8, 22));
        assert!(matches!(
            FileHeader::read(&mut Cursor::new(buf)),
            Err(CramError::MalformedStream { .. })
        ));
    }

    #[test]
    fn truncated_header_errors() {
        let buf = CRAM_MAGIC.to_vec();
        assert!(FileHeader::read(&mut Cursor::new(buf)).is_err());
    }
}
