//! # cram-core
//!
//! Foundational building blocks shared by the CRAM decoding pipeline:
//!
//! - [`bitstream`]: MSB-first bit-level I/O for the codec family
//! - [`itf8`]: CRAM's variable-length big-endian integer encoding
//! - [`error`]: the error taxonomy shared by every decode stage
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Normalizer                                               │
//! │     mate pairing, base/quality reconstruction           │
//! ├─────────────────────────────────────────────────────────┤
//! │ Container / slice parser                                 │
//! │     compression header, record reconstruction           │
//! ├─────────────────────────────────────────────────────────┤
//! │ Codec family                                             │
//! │     Huffman, Beta, Golomb, External                     │
//! ├─────────────────────────────────────────────────────────┤
//! │ BitStream / ITF8 (this crate)                            │
//! └─────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod error;
pub mod itf8;

pub use bitstream::{BitReader, BitWriter};
pub use error::{CramError, Result};
pub use itf8::{read_itf8, read_itf8_array, write_itf8};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{BitReader, BitWriter};
    pub use crate::error::{CramError, Result};
    pub use crate::itf8::{read_itf8, read_itf8_array, write_itf8};
}
