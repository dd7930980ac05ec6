//! The compression header: per-series encodings, substitution matrix, and
//! preservation map that govern how every slice in a container is decoded.

use crate::substitution::SubstitutionMatrix;
use cram_codecs::descriptor::EncodingDescriptor;
use cram_core::error::{CramError, Result};
use cram_core::itf8::read_itf8;
use std::collections::HashMap;
use std::io::Read;

/// The fixed set of data series a compression header may carry an encoding
/// for. Order here has no wire significance; the header is a tag-keyed map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSeries {
    /// Per-record flag bits.
    ReadFlags,
    /// Per-record CRAM compression flags.
    CompressionFlags,
    /// Mate-specific flag bits.
    MateFlags,
    /// Read-group code.
    ReadGroup,
    /// Read length in bases.
    ReadLength,
    /// Alignment-start delta (or absolute value, per `AP_series_delta`).
    AlignmentStart,
    /// Number of read features in a record.
    NumberOfFeatures,
    /// Per-feature operator byte.
    FeatureCode,
    /// Per-feature cumulative position delta.
    FeaturePosition,
    /// Substitution feature code.
    SubstitutionCode,
    /// Deletion feature length.
    DeletionLength,
    /// Insertion/soft-clip feature sequence bytes.
    InsertionBases,
    /// Base data series (unmapped reads / raw sequence, outside feature list).
    Base,
    /// Quality score data series.
    QualityScore,
    /// Read name bytes, when not synthesized.
    ReadName,
    /// Mapping quality.
    MappingQuality,
    /// Mate's sequence id.
    MateSequenceId,
    /// Mate's alignment start.
    MateAlignmentStart,
    /// Template size (TLEN), when stored rather than computed.
    TemplateSize,
    /// Relative forward offset to a downstream mate within the slice.
    NextFragmentDistance,
    /// Number of optional tags.
    TagCount,
    /// Tag id bytes.
    TagIds,
    /// Tag value bytes.
    TagValues,
}

const ALL_SERIES: [DataSeries; 23] = [
    DataSeries::ReadFlags,
    DataSeries::CompressionFlags,
    DataSeries::MateFlags,
    DataSeries::ReadGroup,
    DataSeries::ReadLength,
    DataSeries::AlignmentStart,
    DataSeries::NumberOfFeatures,
    DataSeries::FeatureCode,
    DataSeries::FeaturePosition,
    DataSeries::SubstitutionCode,
    DataSeries::DeletionLength,
    DataSeries::InsertionBases,
    DataSeries::Base,
    DataSeries::QualityScore,
    DataSeries::ReadName,
    DataSeries::MappingQuality,
    DataSeries::MateSequenceId,
    DataSeries::MateAlignmentStart,
    DataSeries::TemplateSize,
    DataSeries::NextFragmentDistance,
    DataSeries::TagCount,
    DataSeries::TagIds,
    DataSeries::TagValues,
];

/// Boolean switches that govern record-reconstruction policy for a
/// container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreservationMap {
    /// Whether alignment starts are stored as deltas against a running
    /// `prev_alignment_start` rather than absolute values.
    pub ap_series_delta: bool,
    /// Whether read names are preserved on the wire rather than synthesized.
    pub read_names_preserved: bool,
    /// Whether quality-score sentinels should be forced-preserved rather
    /// than defaulted (see §4.6 step 5).
    pub force_preserve_quality_scores: bool,
}

impl PreservationMap {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut flags = [0u8; 1];
        reader
            .read_exact(&mut flags)
            .map_err(|_| CramError::truncated_stream(0))?;
        let bits = flags[0];
        Ok(Self {
            ap_series_delta: bits & 0x01 != 0,
            read_names_preserved: bits & 0x02 != 0,
            force_preserve_quality_scores: bits & 0x04 != 0,
        })
    }
}

/// The decoded compression header for one container.
#[derive(Debug, Clone)]
pub struct CompressionHeader {
    /// Per-series encoding descriptor, keyed by data series tag.
    pub encodings: HashMap<DataSeries, EncodingDescriptor>,
    /// Reference-base substitution alphabet.
    pub substitution_matrix: SubstitutionMatrix,
    /// Record-reconstruction policy switches.
    pub preservation: PreservationMap,
}

impl CompressionHeader {
    /// Read the compression header: preservation map, substitution matrix,
    /// then one `(series_tag, descriptor)` pair per known series that the
    /// stream declares (a zero map-count entry leaves a series unset).
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let preservation = PreservationMap::read(reader)?;
        let substitution_matrix = SubstitutionMatrix::read(reader)?;

        let n = read_itf8(reader)?;
        if n < 0 {
            return Err(CramError::malformed_stream("negative encoding map count"));
        }

        let mut encodings = HashMap::new();
        for _ in 0..n {
            let tag = read_itf8(reader)?;
            let series = DataSeries::from_wire(tag)?;
            let descriptor = EncodingDescriptor::read(reader)?;
            encodings.insert(series, descriptor);
        }

        Ok(Self {
            encodings,
            substitution_matrix,
            preservation,
        })
    }

    /// Look up the encoding for `series`, failing `UnsupportedEncoding` (with
    /// id `-1`, meaning "absent" rather than "unrecognized") if the
    /// container never declared one.
    pub fn encoding(&self, series: DataSeries) -> Result<&EncodingDescriptor> {
        self.encodings
            .get(&series)
            .ok_or_else(|| CramError::unsupported_encoding(-1, format!("{series:?}")))
    }
}

impl DataSeries {
    fn from_wire(tag: i32) -> Result<Self> {
        ALL_SERIES
            .get(tag as usize)
            .copied()
            .ok_or_else(|| CramError::malformed_stream(format!("unknown data series tag {tag}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cram_core::itf8::write_itf8;
    use std::io::Cursor;

    fn sample_header_bytes() -> Vec<u8> {
        let mut buf = vec![0b0000_0111u8]; // all three preservation flags set
        buf.extend(std::iter::repeat_n(65u8, 20)); // substitution matrix, arbitrary but valid bytes
        write_itf8(1, &mut buf); // one encoding
        write_itf8(DataSeries::ReadLength as i32, &mut buf);
        let desc = EncodingDescriptor::Beta {
            offset: 0,
            bit_limit: 8,
        };
        desc.write(&mut buf);
        buf
    }

    #[test]
    fn parses_preservation_and_one_encoding() {
        let header = CompressionHeader::read(&mut Cursor::new(sample_header_bytes())).unwrap();
        assert!(header.preservation.ap_series_delta);
        assert!(header.preservation.read_names_preserved);
        assert!(header.preservation.force_preserve_quality_scores);
        assert!(matches!(
            header.encoding(DataSeries::ReadLength).unwrap(),
            EncodingDescriptor::Beta { .. }
        ));
    }

    #[test]
    fn missing_series_is_unsupported_encoding() {
        let header = CompressionHeader::read(&mut Cursor::new(sample_header_bytes())).unwrap();
        assert!(header.encoding(DataSeries::Base).is_err());
    }
}
