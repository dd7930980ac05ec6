//! Error types for CRAM decoding.
//!
//! All variants here are fatal at container granularity: a caller may catch
//! one, skip the offending container, and resume with the next (see the
//! driver in `cram-cli`).

use std::io;
use thiserror::Error;

/// The main error type for CRAM decode operations.
#[derive(Debug, Error)]
pub enum CramError {
    /// I/O error from the underlying reader.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unexpected end of stream on a bit or byte read.
    #[error("truncated stream at bit position {bit_position}")]
    TruncatedStream {
        /// Bit offset into the current slice's bit stream where the read failed.
        bit_position: u64,
    },

    /// Huffman decode fell through, an ITF8 value overflowed, or a block
    /// length was otherwise invalid.
    #[error("malformed stream: {message}")]
    MalformedStream {
        /// Description of what was malformed.
        message: String,
    },

    /// The compression header named a codec id this implementation does
    /// not handle.
    #[error("unsupported encoding id {id} for series {series}")]
    UnsupportedEncoding {
        /// Raw encoding id as it appeared in the compression header.
        id: i32,
        /// Name of the data series the encoding was attached to.
        series: String,
    },

    /// Encode-side lookup of a symbol absent from the codebook.
    #[error("symbol {symbol} not in alphabet")]
    SymbolNotInAlphabet {
        /// The symbol that has no assigned code.
        symbol: i32,
    },

    /// Beta width overflow or Golomb value negative after offset.
    #[error("value out of range: {message}")]
    ValueOutOfRange {
        /// Description of the failed range check.
        message: String,
    },

    /// A feature position fell outside the read length, or an unknown
    /// feature operator byte was encountered.
    #[error("malformed record at index {record_index}: {message}")]
    MalformedRecord {
        /// Index of the offending record within its decode batch.
        record_index: usize,
        /// Description of the malformed field.
        message: String,
    },

    /// The slice's stored reference MD5 disagrees with the reference
    /// source's MD5 over the slice window.
    #[error(
        "reference MD5 mismatch for sequence {sequence_id}: expected {expected}, computed {computed}"
    )]
    RefMd5Mismatch {
        /// Sequence id the slice claims to align against.
        sequence_id: i32,
        /// MD5 recorded in the slice header, hex-encoded.
        expected: String,
        /// MD5 computed from the reference source over the same window, hex-encoded.
        computed: String,
    },

    /// A sequence id referenced by a record or slice is not present in the
    /// SAM header.
    #[error("unknown sequence id {sequence_id}")]
    UnknownSequence {
        /// The unresolved sequence id.
        sequence_id: i32,
    },
}

/// Result type alias for CRAM decode operations.
pub type Result<T> = std::result::Result<T, CramError>;

impl CramError {
    /// Create a truncated-stream error at the given bit position.
    pub fn truncated_stream(bit_position: u64) -> Self {
        Self::TruncatedStream { bit_position }
    }

    /// Create a malformed-stream error.
    pub fn malformed_stream(message: impl Into<String>) -> Self {
        Self::MalformedStream {
            message: message.into(),
        }
    }

    /// Create an unsupported-encoding error.
    pub fn unsupported_encoding(id: i32, series: impl Into<String>) -> Self {
        Self::UnsupportedEncoding {
            id,
            series: series.into(),
        }
    }

    /// Create a symbol-not-in-alphabet error.
    pub fn symbol_not_in_alphabet(symbol: i32) -> Self {
        Self::SymbolNotInAlphabet { symbol }
    }

    /// Create a value-out-of-range error.
    pub fn value_out_of_range(message: impl Into<String>) -> Self {
        Self::ValueOutOfRange {
            message: message.into(),
        }
    }

    /// Create a malformed-record error.
    pub fn malformed_record(record_index: usize, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record_index,
            message: message.into(),
        }
    }

    /// Create a reference-MD5-mismatch error.
    pub fn ref_md5_mismatch(
        sequence_id: i32,
        expected: impl Into<String>,
        computed: impl Into<String>,
    ) -> Self {
        Self::RefMd5Mismatch {
            sequence_id,
            expected: expected.into(),
            computed: computed.into(),
        }
    }

    /// Create an unknown-sequence error.
    pub fn unknown_sequence(sequence_id: i32) -> Self {
        Self::UnknownSequence { sequence_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CramError::malformed_stream("huffman decode fell through");
        assert!(err.to_string().contains("huffman decode fell through"));

        let err = CramError::unsupported_encoding(99, "quality score");
        assert!(err.to_string().contains("99"));
        assert!(err.to_string().contains("quality score"));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        let err: CramError = io_err.into();
        assert!(matches!(err, CramError::Io(_)));
    }
}
