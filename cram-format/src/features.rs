//! `ReadFeature`: the tagged union describing how a read differs from the
//! reference at a given position.

/// A single read feature: a 1-based position within the read plus
/// operator-specific payload.
///
/// The normalizer matches over this exhaustively when expanding a record's
/// feature list into dense base and quality arrays (see
/// `cram_normalize::normalizer`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFeature {
    /// A single-base mismatch against the reference.
    Substitution {
        /// 1-based position within the read.
        position: u32,
        /// Substitution-matrix code selecting the alternate base.
        code: u8,
        /// Filled in by the normalizer during base restoration.
        ref_base: Option<u8>,
        /// Filled in by the normalizer during base restoration.
        base: Option<u8>,
    },
    /// An inserted sequence not present in the reference.
    Insertion {
        /// 1-based position within the read.
        position: u32,
        /// Inserted bases.
        sequence: Vec<u8>,
    },
    /// A deleted run of reference bases.
    Deletion {
        /// 1-based position within the read.
        position: u32,
        /// Number of reference bases skipped.
        length: u32,
    },
    /// A soft-clipped run at the start or end of the read.
    SoftClip {
        /// 1-based position within the read.
        position: u32,
        /// Clipped bases.
        sequence: Vec<u8>,
    },
    /// A single inserted base (a degenerate `Insertion` of length 1).
    InsertBase {
        /// 1-based position within the read.
        position: u32,
        /// The inserted base.
        base: u8,
    },
    /// An explicit quality score at a position, independent of the base.
    BaseQualityScore {
        /// 1-based position within the read.
        position: u32,
        /// The quality score.
        quality: u8,
    },
    /// An explicit base overriding whatever the reference/feature walk
    /// would otherwise produce; applied in a second pass (§4.6 step 4).
    ReadBase {
        /// 1-based position within the read.
        position: u32,
        /// The overriding base.
        base: u8,
        /// Quality score attached to this base, if any.
        quality: Option<u8>,
    },
    /// A hard-clipped run (bases removed from the record entirely).
    HardClip {
        /// 1-based position within the read.
        position: u32,
        /// Number of hard-clipped bases.
        length: u32,
    },
    /// Padding inserted for multiple-sequence alignment purposes.
    Padding {
        /// 1-based position within the read.
        position: u32,
        /// Number of padding bases.
        length: u32,
    },
    /// A reference-skip region (e.g. an intron in spliced RNA-seq data).
    RefSkip {
        /// 1-based position within the read.
        position: u32,
        /// Number of skipped reference bases.
        length: u32,
    },
}

impl ReadFeature {
    /// The 1-based position within the read every variant carries.
    pub fn position(&self) -> u32 {
        match self {
            Self::Substitution { position, .. }
            | Self::Insertion { position, .. }
            | Self::Deletion { position, .. }
            | Self::SoftClip { position, .. }
            | Self::InsertBase { position, .. }
            | Self::BaseQualityScore { position, .. }
            | Self::ReadBase { position, .. }
            | Self::HardClip { position, .. }
            | Self::Padding { position, .. }
            | Self::RefSkip { position, .. } => *position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_accessor_covers_every_variant() {
        let features = [
            ReadFeature::Substitution {
                position: 1,
                code: 0,
                ref_base: None,
                base: None,
            },
            ReadFeature::Insertion {
                position: 2,
                sequence: vec![b'A'],
            },
            ReadFeature::Deletion { position: 3, length: 1 },
            ReadFeature::SoftClip {
                position: 4,
                sequence: vec![b'N'],
            },
            ReadFeature::InsertBase {
                position: 5,
                base: b'A',
            },
            ReadFeature::BaseQualityScore {
                position: 6,
                quality: 30,
            },
            ReadFeature::ReadBase {
                position: 7,
                base: b'G',
                quality: None,
            },
            ReadFeature::HardClip { position: 8, length: 1 },
            ReadFeature::Padding { position: 9, length: 1 },
            ReadFeature::RefSkip { position: 10, length: 1 },
        ];
        for (expected, feature) in (1u32..=10).zip(features.iter()) {
            assert_eq!(feature.position(), expected);
        }
    }
}
