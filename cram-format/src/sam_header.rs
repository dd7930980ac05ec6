//! The SAM header block that follows the file header.
//!
//! CRAM stores the textual SAM header (`@HD`/`@SQ`/...) as a length-prefixed
//! block immediately after [`crate::file_header::FileHeader`]. This crate
//! treats it as an opaque text blob plus the one piece of structure the
//! normalizer needs: the ordered list of reference sequence names, used to
//! resolve a record's `sequence_id` to a human-readable name.

use cram_core::error::{CramError, Result};
use cram_core::itf8::read_itf8;
use std::io::Read;

/// Sentinel name the normalizer uses for records with no alignment.
pub const NO_ALIGNMENT_NAME: &str = "*";

/// The decoded SAM header: raw text plus the `@SQ` sequence name order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SamHeader {
    /// The SAM header text, verbatim.
    pub text: String,
    /// Reference sequence names, in `@SQ` order; `sequence_id` indexes this.
    pub sequence_names: Vec<String>,
}

impl SamHeader {
    /// Read the ITF8-length-prefixed SAM header block.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let len = read_itf8(reader)?;
        if len < 0 {
            return Err(CramError::malformed_stream("negative SAM header length"));
        }
        let mut buf = vec![0u8; len as usize];
        reader
            .read_exact(&mut buf)
            .map_err(|_| CramError::truncated_stream(0))?;
        let text = String::from_utf8_lossy(&buf).into_owned();
        let sequence_names = parse_sequence_names(&text);
        Ok(Self { text, sequence_names })
    }

    /// Resolve a sequence id to its name, or the no-alignment sentinel for
    /// `-1`/`-2` ids. Fails `UnknownSequence` for any other out-of-range id.
    pub fn sequence_name(&self, sequence_id: i32) -> Result<&str> {
        if sequence_id < 0 {
            return Ok(NO_ALIGNMENT_NAME);
        }
        self.sequence_names
            .get(sequence_id as usize)
            .map(String::as_str)
            .ok_or(CramError::unknown_sequence(sequence_id))
    }
}

fn parse_sequence_names(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| line.starts_with("@SQ"))
        .filter_map(|line| {
            line.split('\t')
                .find_map(|field| field.strip_prefix("SN:"))
                .map(str::to_string)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cram_core::itf8::write_itf8;
    use std::io::Cursor;

    #[test]
    fn parses_sequence_names_in_order() {
        let text = "@HD\tVN:1.6\n@SQ\tSN:chr1\tLN:100\n@SQ\tSN:chr2\tLN:200\n";
        let mut buf = Vec::new();
        write_itf8(text.len() as i32, &mut buf);
        buf.extend_from_slice(text.as_bytes());

        let header = SamHeader::read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(header.sequence_names, vec!["chr1", "chr2"]);
        assert_eq!(header.sequence_name(0).unwrap(), "chr1");
        assert_eq!(header.sequence_name(1).unwrap(), "chr2");
    }

    #[test]
    fn negative_sequence_id_is_no_alignment() {
        let header = SamHeader::default();
        assert_eq!(header.sequence_name(-1).unwrap(), NO_ALIGNMENT_NAME);
        assert_eq!(header.sequence_name(-2).unwrap(), NO_ALIGNMENT_NAME);
    }

    #[test]
    fn out_of_range_sequence_id_is_unknown() {
        let header = SamHeader::default();
        assert!(matches!(
            header.sequence_name(0),
            Err(CramError::UnknownSequence { sequence_id: 0 })
        ));
    }
}
