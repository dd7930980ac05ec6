//! `CramRecord`: a single alignment record as produced by the slice parser,
//! before the normalizer fills in mate links, names, bases, and qualities.

use crate::features::ReadFeature;

/// Sentinel recorded when a record has no meaningful
/// `recordsToNextFragment` offset (detached or single-fragment).
pub const NO_NEXT_FRAGMENT: i32 = -1;

bitflags::bitflags! {
    /// Per-record flag bits (the subset of SAM/BAM flags CRAM preserves
    /// directly rather than deriving).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RecordFlags: u16 {
        /// Segment is paired.
        const MULTI_FRAGMENT    = 0x0001;
        /// Each segment is properly aligned.
        const PROPER_PAIR       = 0x0002;
        /// Segment is unmapped.
        const SEGMENT_UNMAPPED  = 0x0004;
        /// Next segment is unmapped.
        const MATE_UNMAPPED     = 0x0008;
        /// SEQ is reverse-complemented.
        const NEGATIVE_STRAND   = 0x0010;
        /// SEQ of the next segment is reverse-complemented.
        const MATE_NEGATIVE     = 0x0020;
        /// First segment in the template.
        const FIRST_SEGMENT     = 0x0040;
        /// Last segment in the template.
        const LAST_SEGMENT      = 0x0080;
        /// Secondary alignment.
        const SECONDARY         = 0x0100;
        /// Not passing filters.
        const QC_FAIL           = 0x0200;
        /// PCR or optical duplicate.
        const DUPLICATE         = 0x0400;
        /// Supplementary alignment.
        const SUPPLEMENTARY     = 0x0800;
    }
}

bitflags::bitflags! {
    /// CRAM-specific per-record compression flags (no SAM/BAM equivalent).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompressionFlags: u8 {
        /// This record's mate is not present in the current slice.
        const DETACHED            = 0x01;
        /// `recordsToNextFragment` points forward to the mate within this slice.
        const HAS_MATE_DOWNSTREAM = 0x02;
        /// Unknown/placeholder quality scores were forced to be preserved.
        const FORCE_PRESERVE_QUAL = 0x04;
    }
}

/// A single alignment record, as reconstructed by the slice parser.
///
/// Mate pointers are batch-relative indices rather than references or raw
/// pointers (`next`/`previous` become `Option<usize>`), since the normalizer
/// builds a forward/backward cycle across mates and a GC-less language can't
/// hold that cycle directly.
#[derive(Debug, Clone)]
pub struct CramRecord {
    /// This record's 0-based index within its decode batch; set by the
    /// normalizer's index-assignment step.
    pub index: usize,
    /// SAM/BAM-style flag bits.
    pub flags: RecordFlags,
    /// CRAM-specific compression flags.
    pub compression_flags: CompressionFlags,
    /// Reference sequence id, or `-1` for unmapped.
    pub sequence_id: i32,
    /// Resolved sequence name; filled by the normalizer's index-assignment step.
    pub sequence_name: Option<String>,
    /// 1-based alignment start coordinate.
    pub alignment_start: i32,
    /// Read length in bases.
    pub read_length: u32,
    /// Read name, if preserved on the wire; `None` until the normalizer
    /// synthesizes one.
    pub read_name: Option<String>,
    /// Mapping quality.
    pub mapping_quality: u8,
    /// Read features, in ascending position order.
    pub features: Vec<ReadFeature>,
    /// Restored bases; empty until the normalizer's base-restoration step.
    pub bases: Vec<u8>,
    /// Restored quality scores; empty until the normalizer's quality step.
    pub quality_scores: Vec<u8>,
    /// Mate's sequence id, once resolved.
    pub mate_sequence_id: i32,
    /// Mate's alignment start, once resolved.
    pub mate_alignment_start: i32,
    /// Whether the mate is unmapped, once resolved.
    pub mate_unmapped: bool,
    /// Whether the mate is on the negative strand, once resolved.
    pub mate_negative_strand: bool,
    /// SAM `TLEN`, computed by the normalizer's mate-restoration step.
    pub template_size: i32,
    /// Relative forward offset (within the slice) to the mate record, as
    /// read from the wire; `-1` when not applicable.
    pub records_to_next_fragment: i32,
    /// Batch-relative index of the next (downstream) mate, once resolved.
    pub next: Option<usize>,
    /// Batch-relative index of the previous (upstream) mate, once resolved.
    pub previous: Option<usize>,
}

impl CramRecord {
    /// Whether this record is a member of a multi-segment template.
    pub fn is_multi_fragment(&self) -> bool {
        self.flags.contains(RecordFlags::MULTI_FRAGMENT)
    }

    /// Whether this record's mate is absent from the current slice.
    pub fn is_detached(&self) -> bool {
        self.compression_flags.contains(CompressionFlags::DETACHED)
    }

    /// Whether `records_to_next_fragment` names a downstream mate in-slice.
    pub fn is_has_mate_downstream(&self) -> bool {
        self.compression_flags
            .contains(CompressionFlags::HAS_MATE_DOWNSTREAM)
    }

    /// Whether this segment is itself unmapped.
    pub fn is_segment_unmapped(&self) -> bool {
        self.flags.contains(RecordFlags::SEGMENT_UNMAPPED)
    }

    /// Whether this segment is reverse-complemented.
    pub fn is_negative_strand(&self) -> bool {
        self.flags.contains(RecordFlags::NEGATIVE_STRAND)
    }

    /// Whether quality placeholders should be forced through rather than
    /// defaulted.
    pub fn force_preserve_quality_scores(&self) -> bool {
        self.compression_flags
            .contains(CompressionFlags::FORCE_PRESERVE_QUAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_record() -> CramRecord {
        CramRecord {
            index: 0,
            flags: RecordFlags::empty(),
            compression_flags: CompressionFlags::empty(),
            sequence_id: -1,
            sequence_name: None,
            alignment_start: -1,
            read_length: 0,
            read_name: None,
            mapping_quality: 0,
            features: Vec::new(),
            bases: Vec::new(),
            quality_scores: Vec::new(),
            mate_sequence_id: -1,
            mate_alignment_start: -1,
            mate_unmapped: false,
            mate_negative_strand: false,
            template_size: 0,
            records_to_next_fragment: NO_NEXT_FRAGMENT,
            next: None,
            previous: None,
        }
    }

    #[test]
    fn flag_predicates_reflect_bits() {
        let mut record = blank_record();
        record.flags = RecordFlags::MULTI_FRAGMENT | RecordFlags::NEGATIVE_STRAND;
        record.compression_flags = CompressionFlags::HAS_MATE_DOWNSTREAM;

        assert!(record.is_multi_fragment());
        assert!(record.is_negative_strand());
        assert!(record.is_has_mate_downstream());
        assert!(!record.is_detached());
    }
}
