//! The container header and the slices it owns.

use crate::compression_header::CompressionHeader;
use crate::slice::Slice;
use cram_core::error::{CramError, Result};
use cram_core::itf8::{read_itf8, read_itf8_array};
use std::io::Read;

/// Sentinel sequence id meaning "records span multiple references".
pub const MULTI_REF: i32 = -1;
/// Sentinel sequence id meaning "no alignment at all".
pub const UNMAPPED: i32 = -2;

/// A container's header fields plus its parsed compression header and
/// slices.
#[derive(Debug, Clone)]
pub struct Container {
    /// Reference sequence id, or [`MULTI_REF`]/[`UNMAPPED`].
    pub sequence_id: i32,
    /// 1-based alignment start of the container's first record.
    pub alignment_start: i32,
    /// Span, in reference bases, covered by this container.
    pub alignment_span: i32,
    /// Total record count across all slices.
    pub n_records: i32,
    /// Total base count across all slices.
    pub n_bases: i32,
    /// CRC32 recorded at the end of the container header (not independently
    /// verified here; see `RefMd5Mismatch` for the one checksum this core
    /// does verify).
    pub crc: u32,
    /// The shared compression header governing every slice below.
    pub compression_header: CompressionHeader,
    /// The container's slices, in stream order.
    pub slices: Vec<Slice>,
}

impl Container {
    /// Read one container: header fields, the compression header block,
    /// then `block_count` slices.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let _compression_header_length = read_itf8(reader)?;
        let sequence_id = read_itf8(reader)?;
        let alignment_start = read_itf8(reader)?;
        let alignment_span = read_itf8(reader)?;
        let n_records = read_itf8(reader)?;
        let n_bases = read_itf8(reader)?;
        let block_count = read_itf8(reader)?;
        if block_count < 0 {
            return Err(CramError::malformed_stream("negative container block count"));
        }
        let _slice_offsets = read_itf8_array(reader)?;
        let mut crc_buf = [0u8; 4];
        reader
            .read_exact(&mut crc_buf)
            .map_err(|_| CramError::truncated_stream(0))?;
        let crc = u32::from_le_bytes(crc_buf);

        let compression_header = CompressionHeader::read(reader)?;

        let mut slices = Vec::with_capacity(block_count.max(0) as usize);
        for _ in 0..block_count {
            slices.push(Slice::read(reader, &compression_header)?);
        }

        Ok(Self {
            sequence_id,
            alignment_start,
            alignment_span,
            n_records,
            n_bases,
            crc,
            compression_header,
            slices,
        })
    }
}
