//! A slice: a contiguous run of records sharing one set of per-series block
//! buffers.

use crate::compression_header::CompressionHeader;
use crate::parser;
use crate::record::CramRecord;
use cram_core::error::{CramError, Result};
use cram_core::itf8::read_itf8;
use std::collections::HashMap;
use std::io::Read;

/// Content id reserved for the slice's single bit-packed "core" block, which
/// feeds every Huffman/Beta/Golomb codec.
pub const CORE_BLOCK_CONTENT_ID: i32 = 0;

/// One slice's header fields plus its reconstructed (but not yet
/// normalized) records.
#[derive(Debug, Clone)]
pub struct Slice {
    /// Reference sequence id this slice aligns against.
    pub sequence_id: i32,
    /// 1-based alignment start of the slice's first record.
    pub alignment_start: i32,
    /// Span, in reference bases, covered by this slice.
    pub alignment_span: i32,
    /// MD5 of the reference bases over this slice's window, as recorded on
    /// the wire.
    pub ref_md5: [u8; 16],
    /// Records in encoded order, not yet touched by the normalizer.
    pub records: Vec<CramRecord>,
}

impl Slice {
    /// Read one slice: header, per-block byte buffers, then reconstruct
    /// `n_records` records against `compression_header`'s encodings.
    pub fn read<R: Read>(reader: &mut R, compression_header: &CompressionHeader) -> Result<Self> {
        let sequence_id = read_itf8(reader)?;
        let alignment_start = read_itf8(reader)?;
        let alignment_span = read_itf8(reader)?;
        let n_records = read_itf8(reader)?;
        if n_records < 0 {
            return Err(CramError::malformed_stream("negative slice record count"));
        }

        let mut ref_md5 = [0u8; 16];
        reader
            .read_exact(&mut ref_md5)
            .map_err(|_| CramError::truncated_stream(0))?;

        let n_blocks = read_itf8(reader)?;
        if n_blocks < 0 {
            return Err(CramError::malformed_stream("negative slice block count"));
        }

        let mut blocks: HashMap<i32, Vec<u8>> = HashMap::new();
        for _ in 0..n_blocks {
            let content_id = read_itf8(reader)?;
            let len = read_itf8(reader)?;
            if len < 0 {
                return Err(CramError::malformed_stream("negative slice block length"));
            }
            let mut data = vec![0u8; len as usize];
            reader
                .read_exact(&mut data)
                .map_err(|_| CramError::truncated_stream(0))?;
            blocks.insert(content_id, data);
        }

        let core_block = blocks.remove(&CORE_BLOCK_CONTENT_ID).unwrap_or_default();

        let records = parser::parse_records(
            n_records as usize,
            core_block,
            blocks,
            compression_header,
            sequence_id,
            alignment_start,
        )?;

        Ok(Self {
            sequence_id,
            alignment_start,
            alignment_span,
            ref_md5,
            records,
        })
    }

    /// Verify this slice's recorded reference MD5 against `reference_bases`,
    /// a 1-based alignment-coordinate-aligned reference (index 0 = position
    /// 1), hashing the `[alignment_start-1, alignment_start-1+alignment_span)`
    /// window. Fails `RefMd5Mismatch` on disagreement; callers that want to
    /// downgrade this to a warning should catch and log rather than propagate.
    pub fn verify_ref_md5(&self, reference_bases: &[u8]) -> Result<()> {
        let start = (self.alignment_start - 1).max(0) as usize;
        let end = (start + self.alignment_span.max(0) as usize).min(reference_bases.len());
        let window = reference_bases.get(start..end).unwrap_or(&[]);
        let computed = md5::compute(window);
        if computed.0 != self.ref_md5 {
            return Err(CramError::ref_md5_mismatch(
                self.sequence_id,
                hex_encode(&self.ref_md5),
                hex_encode(&computed.0),
            ));
        }
        Ok(())
    }
}

fn hex_encode(bytes: &[u8; 16]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_reference_window_verifies() {
        let reference = b"ACGTACGTACGT".to_vec();
        let window = &reference[0..8];
        let slice = Slice {
            sequence_id: 0,
            alignment_start: 1,
            alignment_span: 8,
            ref_md5: md5::compute(window).0,
            records: Vec::new(),
        };
        assert!(slice.verify_ref_md5(&reference).is_ok());
    }

    #[test]
    fn mismatched_reference_window_fails() {
        let reference = b"ACGTACGTACGT".to_vec();
        let slice = Slice {
            sequence_id: 3,
            alignment_start: 1,
            alignment_span: 8,
            ref_md5: [0u8; 16],
            records: Vec::new(),
        };
        assert!(matches!(
            slice.verify_ref_md5(&reference),
            Err(CramError::RefMd5Mismatch { sequence_id: 3, .. })
        ));
    }

    #[test]
    fn window_past_reference_end_is_truncated_not_panicking() {
        let reference = b"ACGT".to_vec();
        let slice = Slice {
            sequence_id: 0,
            alignment_start: 1,
            alignment_span: 100,
            ref_md5: md5::compute(&reference).0,
            records: Vec::new(),
        };
        assert!(slice.verify_ref_md5(&reference).is_ok());
    }
}
