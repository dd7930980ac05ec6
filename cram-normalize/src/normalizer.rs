//! The normalizer: post-processes one container's record batch into its
//! final, absolute form (§4.6).
//!
//! Runs in five ordered passes over the batch: index assignment, mate
//! restoration, name synthesis, base restoration, quality restoration. Each
//! pass is total over the batch before the next begins; none of them retry
//! or skip a record on error; a bad position aborts the whole batch.

use cram_format::features::ReadFeature;
use cram_format::record::{CompressionFlags, CramRecord, RecordFlags};
use cram_format::sam_header::{SamHeader, NO_ALIGNMENT_NAME};
use cram_format::substitution::SubstitutionMatrix;
use cram_core::error::{CramError, Result};

/// Sentinel quality-score value meaning "not yet assigned"; distinguished
/// from a real Phred score, which tops out well below 255 in practice.
pub const QUALITY_UNSET: u8 = 0xFF;

/// Everything the normalizer needs beyond the record batch itself.
pub struct NormalizeContext<'a> {
    /// Reference bases for the container's sequence id, 1-based
    /// alignment-coordinate-aligned (index 0 = reference position 1).
    /// Empty for an unmapped container.
    pub reference_bases: &'a [u8],
    /// The container's substitution alphabet.
    pub substitution_matrix: &'a SubstitutionMatrix,
    /// SAM header, used to resolve sequence ids to names.
    pub sam_header: &'a SamHeader,
    /// Whether quality-score sentinels are forced-preserved rather than
    /// defaulted (preservation map's `force_preserve_quality_scores`).
    pub force_preserve_quality_scores: bool,
    /// Default quality score used to fill unassigned positions.
    pub default_quality_score: u8,
    /// Prefix used when synthesizing a read name (`prefix + index`).
    pub read_name_prefix: &'a str,
}

/// Normalize one container's record batch in place. `counter` is the
/// monotonic read counter threaded across batches within a decode session
/// (§9): its value on entry is this batch's `start_counter`.
pub fn normalize(records: &mut [CramRecord], ctx: &NormalizeContext, counter: &mut usize) -> Result<()> {
    let start_counter = *counter;
    assign_indices(records, ctx, counter)?;
    restore_mates(records, start_counter)?;
    synthesize_names(records, ctx);
    for i in 0..records.len() {
        restore_bases(records, i, ctx)?;
    }
    for i in 0..records.len() {
        restore_qualities(&mut records[i], ctx)?;
    }
    Ok(())
}

fn assign_indices(records: &mut [CramRecord], ctx: &NormalizeContext, counter: &mut usize) -> Result<()> {
    for record in records.iter_mut() {
        record.index = *counter;
        *counter += 1;
        record.sequence_name = Some(
            ctx.sam_header
                .sequence_name(record.sequence_id)
                .map(str::to_string)
                .unwrap_or_else(|_| NO_ALIGNMENT_NAME.to_string()),
        );
    }
    Ok(())
}

fn restore_mates(records: &mut [CramRecord], start_counter: usize) -> Result<()> {
    for i in 0..records.len() {
        let r = &records[i];
        if !r.is_multi_fragment() || r.is_detached() {
            records[i].next = None;
            records[i].previous = None;
            records[i].records_to_next_fragment = -1;
            continue;
        }
        if !r.is_has_mate_downstream() {
            continue;
        }

        let j = (r.index as i64 + r.records_to_next_fragment as i64 - start_counter as i64) as isize;
        if j < 0 || j as usize >= records.len() {
            return Err(CramError::malformed_record(
                r.index,
                format!("mate offset resolves outside the current batch (j={j})"),
            ));
        }
        let j = j as usize;

        records[i].next = Some(j);
        records[j].previous = Some(i);

        let (i_seq, i_start, i_unmapped, i_neg) = {
            let r = &records[i];
            (r.sequence_id, r.alignment_start, r.is_segment_unmapped(), r.is_negative_strand())
        };
        let (j_seq, j_start, j_unmapped, j_neg) = {
            let m = &records[j];
            (m.sequence_id, m.alignment_start, m.is_segment_unmapped(), m.is_negative_strand())
        };

        records[i].mate_sequence_id = j_seq;
        records[i].mate_alignment_start = j_start;
        records[i].mate_unmapped = j_unmapped;
        records[i].mate_negative_strand = j_neg;

        records[j].mate_sequence_id = i_seq;
        records[j].mate_alignment_start = i_start;
        records[j].mate_unmapped = i_unmapped;
        records[j].mate_negative_strand = i_neg;

        if i_seq < 0 {
            records[j].mate_alignment_start = -1;
        }
        if j_seq < 0 {
            records[i].mate_alignment_start = -1;
        }

        let tlen = compute_template_size(&records[i], &records[j]);
        records[i].template_size = tlen;
        records[j].template_size = -tlen;
    }
    Ok(())
}

/// SAM `TLEN`: for mates on the same reference, the span between the
/// leftmost and rightmost mapped coordinate, positive for the leftmost
/// record and negative for the rightmost, ties broken by record order.
/// Zero across different references.
fn compute_template_size(a: &CramRecord, b: &CramRecord) -> i32 {
    if a.sequence_id != b.sequence_id || a.sequence_id < 0 {
        return 0;
    }
    let a_end = a.alignment_start + a.read_length as i32;
    let b_end = b.alignment_start + b.read_length as i32;
    let leftmost = a.alignment_start.min(b.alignment_start);
    let rightmost = a_end.max(b_end);
    let span = rightmost - leftmost;

    let a_is_left = match a.alignment_start.cmp(&b.alignment_start) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => a.index <= b.index,
    };
    if a_is_left { span } else { -span }
}

fn synthesize_names(records: &mut [CramRecord], ctx: &NormalizeContext) {
    for i in 0..records.len() {
        if records[i].read_name.is_some() {
            continue;
        }
        let name = format!("{}{}", ctx.read_name_prefix, records[i].index);
        records[i].read_name = Some(name.clone());
        if let Some(j) = records[i].next {
            if records[j].read_name.is_none() {
                records[j].read_name = Some(name.clone());
            }
        }
        if let Some(j) = records[i].previous {
            if records[j].read_name.is_none() {
                records[j].read_name = Some(name);
            }
        }
    }
}

fn restore_bases(records: &mut [CramRecord], i: usize, ctx: &NormalizeContext) -> Result<()> {
    let record = &records[i];
    if record.is_segment_unmapped() {
        return Ok(());
    }
    let len = record.read_length as usize;
    let ref_start = (record.alignment_start - 1).max(0) as usize;

    let mut bases = vec![0u8; len];

    if record.features.is_empty() {
        for (offset, slot) in bases.iter_mut().enumerate() {
            *slot = ctx.reference_bases.get(ref_start + offset).copied().unwrap_or(b'N');
        }
        records[i].bases = bases.into_iter().map(normalize_base).collect();
        return Ok(());
    }

    let mut pos_in_read: usize = 1;
    let mut pos_in_seq: usize = 0;

    let feature_count = records[i].features.len();
    for f in 0..feature_count {
        let feature_pos = records[i].features[f].position() as usize;
        while pos_in_read < feature_pos && pos_in_read <= len {
            bases[pos_in_read - 1] = ctx
                .reference_bases
                .get(ref_start + pos_in_seq)
                .copied()
                .unwrap_or(b'N');
            pos_in_read += 1;
            pos_in_seq += 1;
        }

        match &mut records[i].features[f] {
            ReadFeature::Substitution { code, ref_base, base, .. } => {
                let rb = ctx
                    .reference_bases
                    .get(ref_start + pos_in_seq)
                    .copied()
                    .unwrap_or(b'N');
                let alt = ctx.substitution_matrix.base(rb, *code)?;
                if pos_in_read <= len {
                    bases[pos_in_read - 1] = alt;
                }
                *ref_base = Some(rb);
                *base = Some(alt);
                pos_in_read += 1;
                pos_in_seq += 1;
            }
            ReadFeature::Insertion { sequence, .. } | ReadFeature::SoftClip { sequence, .. } => {
                for &b in sequence.iter() {
                    if pos_in_read <= len {
                        bases[pos_in_read - 1] = b;
                    }
                    pos_in_read += 1;
                }
            }
            ReadFeature::InsertBase { base, .. } => {
                if pos_in_read <= len {
                    bases[pos_in_read - 1] = *base;
                }
                pos_in_read += 1;
            }
            ReadFeature::Deletion { length, .. } | ReadFeature::RefSkip { length, .. } => {
                pos_in_seq += *length as usize;
            }
            ReadFeature::Padding { length, .. } => {
                pos_in_read += *length as usize;
            }
            ReadFeature::HardClip { .. } => {}
            ReadFeature::BaseQualityScore { .. } | ReadFeature::ReadBase { .. } => {}
        }
    }

    while pos_in_read <= len {
        bases[pos_in_read - 1] = ctx
            .reference_bases
            .get(ref_start + pos_in_seq)
            .copied()
            .unwrap_or(b'N');
        pos_in_read += 1;
        pos_in_seq += 1;
    }

    for feature in &records[i].features {
        if let ReadFeature::ReadBase { position, base, .. } = feature {
            let idx = *position as usize;
            if idx == 0 || idx > len {
                return Err(CramError::malformed_record(
                    records[i].index,
                    format!("ReadBase position {idx} outside read length {len}"),
                ));
            }
            bases[idx - 1] = *base;
        }
    }

    records[i].bases = bases.into_iter().map(normalize_base).collect();
    Ok(())
}

fn normalize_base(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b @ (b'A' | b'C' | b'G' | b'T' | b'N' | b'R' | b'Y' | b'S' | b'W' | b'K' | b'M' | b'B'
        | b'D' | b'H' | b'V') => b,
        _ => b'N',
    }
}

fn restore_qualities(record: &mut CramRecord, ctx: &NormalizeContext) -> Result<()> {
    let len = record.read_length as usize;

    if record.compression_flags.contains(CompressionFlags::FORCE_PRESERVE_QUAL)
        || ctx.force_preserve_quality_scores
    {
        for q in record.quality_scores.iter_mut() {
            if *q == QUALITY_UNSET {
                *q = ctx.default_quality_score;
            }
        }
        return Ok(());
    }

    let mut scores = vec![ctx.default_quality_score; len];
    for feature in &record.features {
        let (position, quality) = match feature {
            ReadFeature::BaseQualityScore { position, quality } => (*position, Some(*quality)),
            ReadFeature::ReadBase { position, quality, .. } => (*position, *quality),
            _ => continue,
        };
        if let Some(quality) = quality {
            let idx = position as usize;
            if idx == 0 || idx > len {
                return Err(CramError::malformed_record(
                    record.index,
                    format!("quality feature position {idx} outside read length {len}"),
                ));
            }
            scores[idx - 1] = quality;
        }
    }
    record.quality_scores = scores;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cram_format::record::NO_NEXT_FRAGMENT;

    fn blank_record(index: usize) -> CramRecord {
        CramRecord {
            index,
            flags: RecordFlags::empty(),
            compression_flags: CompressionFlags::empty(),
            sequence_id: 0,
            sequence_name: None,
            alignment_start: 1,
            read_length: 8,
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

    fn ctx<'a>(reference: &'a [u8], matrix: &'a SubstitutionMatrix, header: &'a SamHeader) -> NormalizeContext<'a> {
        NormalizeContext {
            reference_bases: reference,
            substitution_matrix: matrix,
            sam_header: header,
            force_preserve_quality_scores: false,
            default_quality_score: 30,
            read_name_prefix: "read",
        }
    }

    #[test]
    fn base_restoration_without_features_copies_reference() {
        let reference = b"ACGTACGT".to_vec();
        let matrix = SubstitutionMatrix::from_table([[0; 4]; 5]);
        let header = SamHeader {
            text: String::new(),
            sequence_names: vec!["chr1".to_string()],
        };
        let mut records = vec![blank_record(0)];
        let mut counter = 0;
        normalize(&mut records, &ctx(&reference, &matrix, &header), &mut counter).unwrap();
        assert_eq!(records[0].bases, reference);
    }

    #[test]
    fn base_restoration_with_substitution() {
        let reference = b"ACGTACGT".to_vec();
        let matrix = SubstitutionMatrix::from_table([
            [b'C', b'G', b'T', b'N'],
            [b'A', b'G', b'T', b'N'],
            [b'A', b'C', b'T', b'N'],
            [b'C', b'G', b'A', b'N'],
            [b'A', b'C', b'G', b'T'],
        ]);
        let header = SamHeader {
            text: String::new(),
            sequence_names: vec!["chr1".to_string()],
        };
        let mut record = blank_record(0);
        record.features.push(ReadFeature::Substitution {
            position: 4,
            code: 1, // T -> G per the matrix above
            ref_base: None,
            base: None,
        });
        let mut records = vec![record];
        let mut counter = 0;
        normalize(&mut records, &ctx(&reference, &matrix, &header), &mut counter).unwrap();
        assert_eq!(records[0].bases, b"ACGGACGT");
    }

    #[test]
    fn insertion_then_deletion() {
        let reference = b"ACGTACGT".to_vec();
        let matrix = SubstitutionMatrix::from_table([[0; 4]; 5]);
        let header = SamHeader {
            text: String::new(),
            sequence_names: vec!["chr1".to_string()],
        };
        let mut record = blank_record(0);
        record.features.push(ReadFeature::Insertion {
            position: 3,
            sequence: b"NN".to_vec(),
        });
        record.features.push(ReadFeature::Deletion { position: 5, length: 2 });
        let mut records = vec![record];
        let mut counter = 0;
        normalize(&mut records, &ctx(&reference, &matrix, &header), &mut counter).unwrap();
        assert_eq!(records[0].bases, b"ACNNGTGT");
    }

    #[test]
    fn mate_pairing_links_and_shares_name() {
        let reference = b"".to_vec();
        let matrix = SubstitutionMatrix::from_table([[0; 4]; 5]);
        let header = SamHeader {
            text: String::new(),
            sequence_names: vec!["chr1".to_string()],
        };
        let mut first = blank_record(0);
        first.flags = RecordFlags::MULTI_FRAGMENT;
        first.compression_flags = CompressionFlags::HAS_MATE_DOWNSTREAM;
        first.records_to_next_fragment = 1;
        first.sequence_id = -1;

        let mut second = blank_record(0);
        second.flags = RecordFlags::MULTI_FRAGMENT;
        second.sequence_id = -1;

        let mut records = vec![first, second];
        let mut counter = 0;
        normalize(&mut records, &ctx(&reference, &matrix, &header), &mut counter).unwrap();

        assert_eq!(records[0].next, Some(1));
        assert_eq!(records[1].previous, Some(0));
        assert_eq!(records[0].read_name, records[1].read_name);
    }
}
