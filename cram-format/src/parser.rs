//! Record reconstruction: the inner loop that walks a slice's per-series
//! codec streams in lock-step to produce `n_records` [`CramRecord`]s.
//!
//! The parser does not resolve mate pointers, synthesize names, or restore
//! bases/qualities — that is the normalizer's job (§4.6), run once the
//! whole batch across every slice in a container has been assembled.

use crate::compression_header::{CompressionHeader, DataSeries};
use crate::features::ReadFeature;
use crate::record::{CompressionFlags, CramRecord, RecordFlags, NO_NEXT_FRAGMENT};
use cram_codecs::descriptor::EncodingDescriptor;
use cram_codecs::external::ExternalCodec;
use cram_core::bitstream::BitReader;
use cram_core::error::{CramError, Result};
use std::collections::HashMap;
use std::io::Cursor;

/// One-byte tags identifying a feature's operator, in the order
/// [`ReadFeature`]'s variants are declared.
mod feature_tag {
    pub const SUBSTITUTION: i32 = 0;
    pub const INSERTION: i32 = 1;
    pub const DELETION: i32 = 2;
    pub const SOFT_CLIP: i32 = 3;
    pub const INSERT_BASE: i32 = 4;
    pub const BASE_QUALITY_SCORE: i32 = 5;
    pub const READ_BASE: i32 = 6;
    pub const HARD_CLIP: i32 = 7;
    pub const PADDING: i32 = 8;
    pub const REF_SKIP: i32 = 9;
}

/// Live decode context: the slice's core bit stream plus one byte-cursor per
/// external block, threaded through the whole record loop.
struct Context<'h> {
    header: &'h CompressionHeader,
    core: BitReader<Cursor<Vec<u8>>>,
    external: HashMap<i32, Cursor<Vec<u8>>>,
}

impl<'h> Context<'h> {
    /// Decode the next integer for `series` using whatever codec its
    /// descriptor names.
    fn read_integer(&mut self, series: DataSeries) -> Result<i32> {
        let descriptor = self.header.encoding(series)?.clone();
        match &descriptor {
            EncodingDescriptor::External { block_content_id } => {
                let cursor = self.block_cursor(*block_content_id)?;
                let mut codec = ExternalCodec::new(cursor);
                let value = codec.read_itf8();
                *self.external.get_mut(block_content_id).unwrap() = codec.into_inner();
                value
            }
            EncodingDescriptor::HuffmanInt { .. }
            | EncodingDescriptor::HuffmanByte { .. }
            | EncodingDescriptor::Beta { .. }
            | EncodingDescriptor::Golomb { .. } => {
                let codec = descriptor.build_bitstream_codec()?;
                codec.read_integer(&mut self.core)
            }
            EncodingDescriptor::ByteArrayLen { .. } | EncodingDescriptor::ByteArrayStop { .. } => {
                Err(CramError::malformed_stream(format!(
                    "{series:?} has a byte-array encoding where an integer was expected"
                )))
            }
        }
    }

    /// Decode a raw byte via whatever codec `series` names, widening
    /// Huffman/Beta/Golomb results down to `u8`. An `External` encoding is
    /// read as a single raw byte rather than an ITF8 integer, since byte
    /// series (bases, qualities, substitution codes) are stored unwrapped.
    fn read_byte(&mut self, series: DataSeries) -> Result<u8> {
        let descriptor = self.header.encoding(series)?.clone();
        if let EncodingDescriptor::External { block_content_id } = &descriptor {
            let cursor = self.block_cursor(*block_content_id)?;
            let mut codec = ExternalCodec::new(cursor);
            let value = codec.read_byte();
            *self.external.get_mut(block_content_id).unwrap() = codec.into_inner();
            return value;
        }
        Ok(self.read_integer(series)? as u8)
    }

    /// Decode a byte array for `series`: either `len` raw/huffman bytes, or
    /// (for `ByteArrayStop`) bytes up to a sentinel.
    fn read_byte_array(&mut self, series: DataSeries, len: usize) -> Result<Vec<u8>> {
        let descriptor = self.header.encoding(series)?.clone();
        match &descriptor {
            EncodingDescriptor::ByteArrayStop {
                stop_byte,
                external_block_content_id,
            } => {
                let cursor = self.block_cursor(*external_block_content_id)?;
                let mut codec = ExternalCodec::new(cursor);
                let mut bytes = Vec::new();
                loop {
                    let b = codec.read_byte()?;
                    if b == *stop_byte {
                        break;
                    }
                    bytes.push(b);
                }
                *self.external.get_mut(external_block_content_id).unwrap() = codec.into_inner();
                Ok(bytes)
            }
            EncodingDescriptor::External { block_content_id } => {
                let cursor = self.block_cursor(*block_content_id)?;
                let mut codec = ExternalCodec::new(cursor);
                let bytes = codec.read_bytes(len);
                *self.external.get_mut(block_content_id).unwrap() = codec.into_inner();
                bytes
            }
            _ => {
                let codec = descriptor.build_bitstream_codec()?;
                (0..len)
                    .map(|_| codec.read_integer(&mut self.core).map(|v| v as u8))
                    .collect()
            }
        }
    }

    fn block_cursor(&mut self, content_id: i32) -> Result<Cursor<Vec<u8>>> {
        self.external
            .get(&content_id)
            .cloned()
            .ok_or_else(|| CramError::malformed_stream(format!("no external block {content_id}")))
    }
}

/// Reconstruct `n_records` records from one slice's core block and external
/// blocks, per §4.5.
pub fn parse_records(
    n_records: usize,
    core_block: Vec<u8>,
    external_blocks: HashMap<i32, Vec<u8>>,
    header: &CompressionHeader,
    slice_sequence_id: i32,
    slice_alignment_start: i32,
) -> Result<Vec<CramRecord>> {
    let mut ctx = Context {
        header,
        core: BitReader::new(Cursor::new(core_block)),
        external: external_blocks
            .into_iter()
            .map(|(id, bytes)| (id, Cursor::new(bytes)))
            .collect(),
    };

    let mut records = Vec::with_capacity(n_records);
    let mut prev_alignment_start = slice_alignment_start;

    for record_index in 0..n_records {
        let record = parse_one_record(
            &mut ctx,
            header,
            slice_sequence_id,
            &mut prev_alignment_start,
            record_index,
        )?;
        records.push(record);
    }

    Ok(records)
}

fn parse_one_record(
    ctx: &mut Context,
    header: &CompressionHeader,
    sequence_id: i32,
    prev_alignment_start: &mut i32,
    record_index: usize,
) -> Result<CramRecord> {
    let raw_flags = ctx.read_integer(DataSeries::ReadFlags)? as u16;
    let flags = RecordFlags::from_bits_truncate(raw_flags);

    let raw_compression_flags = ctx.read_byte(DataSeries::CompressionFlags)?;
    let compression_flags = CompressionFlags::from_bits_truncate(raw_compression_flags);

    let _mate_flags = ctx.read_byte(DataSeries::MateFlags)?;
    let _read_group = ctx.read_integer(DataSeries::ReadGroup)?;

    let read_name = if header.preservation.read_names_preserved {
        let bytes = ctx.read_byte_array(DataSeries::ReadName, 0)?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        None
    };

    let read_length = ctx.read_integer(DataSeries::ReadLength)? as u32;

    let alignment_start = if header.preservation.ap_series_delta {
        let delta = ctx.read_integer(DataSeries::AlignmentStart)?;
        *prev_alignment_start += delta;
        *prev_alignment_start
    } else {
        ctx.read_integer(DataSeries::AlignmentStart)?
    };

    let mapping_quality = ctx.read_byte(DataSeries::MappingQuality)?;

    let mut features = Vec::new();
    if !flags.contains(RecordFlags::SEGMENT_UNMAPPED) {
        let n_features = ctx.read_integer(DataSeries::NumberOfFeatures)?;
        if n_features < 0 {
            return Err(CramError::malformed_record(
                record_index,
                "negative feature count",
            ));
        }
        let mut position = 0u32;
        for _ in 0..n_features {
            let tag = ctx.read_integer(DataSeries::FeatureCode)?;
            let delta = ctx.read_integer(DataSeries::FeaturePosition)?;
            position += delta as u32;
            features.push(read_feature(ctx, tag, position, record_index)?);
        }
    }

    let mut mate_sequence_id = -1;
    let mut mate_alignment_start = -1;
    let mut template_size = 0;
    let mut read_name = read_name;

    if compression_flags.contains(CompressionFlags::DETACHED) {
        let _mate_flags = ctx.read_byte(DataSeries::MateFlags)?;
        mate_sequence_id = ctx.read_integer(DataSeries::MateSequenceId)?;
        mate_alignment_start = ctx.read_integer(DataSeries::MateAlignmentStart)?;
        template_size = ctx.read_integer(DataSeries::TemplateSize)?;
        if read_name.is_none() {
            let bytes = ctx.read_byte_array(DataSeries::ReadName, 0)?;
            read_name = Some(String::from_utf8_lossy(&bytes).into_owned());
        }
    }

    let records_to_next_fragment = if flags.contains(RecordFlags::MULTI_FRAGMENT)
        && !compression_flags.contains(CompressionFlags::DETACHED)
    {
        ctx.read_integer(DataSeries::NextFragmentDistance)?
    } else {
        NO_NEXT_FRAGMENT
    };

    let tag_count = ctx.read_integer(DataSeries::TagCount).unwrap_or(0).max(0);
    for _ in 0..tag_count {
        let _tag_id = ctx.read_byte_array(DataSeries::TagIds, 3)?;
        let value_len = ctx.read_integer(DataSeries::TagValues).unwrap_or(0).max(0);
        let _tag_value = ctx.read_byte_array(DataSeries::TagValues, value_len as usize)?;
    }

    Ok(CramRecord {
        index: record_index,
        flags,
        compression_flags,
        sequence_id,
        sequence_name: None,
        alignment_start,
        read_length,
        read_name,
        mapping_quality,
        features,
        bases: Vec::new(),
        quality_scores: Vec::new(),
        mate_sequence_id,
        mate_alignment_start,
        mate_unmapped: false,
        mate_negative_strand: false,
        template_size,
        records_to_next_fragment,
        next: None,
        previous: None,
    })
}

fn read_feature(
    ctx: &mut Context,
    tag: i32,
    position: u32,
    record_index: usize,
) -> Result<ReadFeature> {
    use feature_tag::*;
    Ok(match tag {
        SUBSTITUTION => ReadFeature::Substitution {
            position,
            code: ctx.read_byte(DataSeries::SubstitutionCode)?,
            ref_base: None,
            base: None,
        },
        INSERTION => ReadFeature::Insertion {
            position,
            sequence: {
                let len = ctx.read_integer(DataSeries::DeletionLength)?.max(0);
                ctx.read_byte_array(DataSeries::InsertionBases, len as usize)?
            },
        },
        DELETION => ReadFeature::Deletion {
            position,
            length: ctx.read_integer(DataSeries::DeletionLength)? as u32,
        },
        SOFT_CLIP => ReadFeature::SoftClip {
            position,
            sequence: {
                let len = ctx.read_integer(DataSeries::DeletionLength)?.max(0);
                ctx.read_byte_array(DataSeries::InsertionBases, len as usize)?
            },
        },
        INSERT_BASE => ReadFeature::InsertBase {
            position,
            base: ctx.read_byte(DataSeries::Base)?,
        },
        BASE_QUALITY_SCORE => ReadFeature::BaseQualityScore {
            position,
            quality: ctx.read_byte(DataSeries::QualityScore)?,
        },
        READ_BASE => ReadFeature::ReadBase {
            position,
            base: ctx.read_byte(DataSeries::Base)?,
            quality: Some(ctx.read_byte(DataSeries::QualityScore)?),
        },
        HARD_CLIP => ReadFeature::HardClip {
            position,
            length: ctx.read_integer(DataSeries::DeletionLength)? as u32,
        },
        PADDING => ReadFeature::Padding {
            position,
            length: ctx.read_integer(DataSeries::DeletionLength)? as u32,
        },
        REF_SKIP => ReadFeature::RefSkip {
            position,
            length: ctx.read_integer(DataSeries::DeletionLength)? as u32,
        },
        other => {
            return Err(CramError::malformed_record(
                record_index,
                format!("unknown read feature operator {other}"),
            ));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression_header::PreservationMap;
    use crate::substitution::SubstitutionMatrix;
    use cram_core::itf8::write_itf8;

    fn external_only_header(series: &[DataSeries]) -> CompressionHeader {
        let mut encodings = HashMap::new();
        for &s in series {
            encodings.insert(s, EncodingDescriptor::External { block_content_id: 1 });
        }
        CompressionHeader {
            encodings,
            substitution_matrix: SubstitutionMatrix::from_table([[b'A'; 4]; 5]),
            preservation: PreservationMap::default(),
        }
    }

    #[test]
    fn reconstructs_two_unmapped_records_from_one_external_block() {
        let header = external_only_header(&[
            DataSeries::ReadFlags,
            DataSeries::CompressionFlags,
            DataSeries::MateFlags,
            DataSeries::ReadGroup,
            DataSeries::ReadLength,
            DataSeries::AlignmentStart,
            DataSeries::MappingQuality,
            DataSeries::TagCount,
        ]);

        let mut block = Vec::new();
        for _ in 0..2 {
            write_itf8(0x0004, &mut block); // ReadFlags: SEGMENT_UNMAPPED
            block.push(0); // CompressionFlags
            block.push(0); // MateFlags
            write_itf8(0, &mut block); // ReadGroup
            write_itf8(4, &mut block); // ReadLength
            write_itf8(1, &mut block); // AlignmentStart
            block.push(0); // MappingQuality
            write_itf8(0, &mut block); // TagCount
        }

        let mut external_blocks = HashMap::new();
        external_blocks.insert(1, block);

        let records = parse_records(2, Vec::new(), external_blocks, &header, 0, 1).unwrap();

        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(record.is_segment_unmapped());
            assert_eq!(record.read_length, 4);
            assert_eq!(record.alignment_start, 1);
            assert_eq!(record.sequence_id, 0);
            assert!(record.features.is_empty());
        }
    }
}
