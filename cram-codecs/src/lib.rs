//! # cram-codecs
//!
//! Per-series codecs for CRAM data series:
//!
//! - [`huffman`]: canonical Huffman, integer and byte variants
//! - [`beta`]: fixed-width with offset
//! - [`golomb`]: unary-quotient / truncated-binary with offset
//! - [`external`]: raw passthrough from a slice's side-channel block
//! - [`descriptor`]: the encoding descriptor tagged union and its wire format
//!
//! The encoding-id to codec mapping is a closed enumeration (see
//! [`descriptor::EncodingDescriptor`]); there is no dynamic dispatch here,
//! only a `match` over a small set of concrete codecs.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod beta;
pub mod descriptor;
pub mod external;
pub mod golomb;
pub mod huffman;

pub use beta::BetaCodec;
pub use descriptor::{BitstreamCodec, EncodingDescriptor, EncodingId};
pub use external::ExternalCodec;
pub use golomb::GolombCodec;
pub use huffman::{HuffmanBitCode, HuffmanCodec};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::beta::BetaCodec;
    pub use crate::descriptor::{BitstreamCodec, EncodingDescriptor, EncodingId};
    pub use crate::external::ExternalCodec;
    pub use crate::golomb::GolombCodec;
    pub use crate::huffman::{HuffmanBitCode, HuffmanCodec};
}
