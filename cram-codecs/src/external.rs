//! External codec: raw bytes pulled from a slice's side-channel block.
//!
//! Unlike the bit-level codecs, an External series has no internal
//! structure; the slice parser hands it a dedicated byte buffer and it
//! yields bytes (or ITF8 integers, depending on the series) in order.

use cram_core::error::{CramError, Result};
use cram_core::itf8::read_itf8;
use std::io::Read;

/// Reads raw values from a slice-local byte buffer, untouched by any codec.
#[derive(Debug)]
pub struct ExternalCodec<R: Read> {
    reader: R,
}

impl<R: Read> ExternalCodec<R> {
    /// Wrap a reader over the series' external block.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read a single raw byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.reader
            .read_exact(&mut buf)
            .map_err(|_| CramError::truncated_stream(0))?;
        Ok(buf[0])
    }

    /// Read `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.reader
            .read_exact(&mut buf)
            .map_err(|_| CramError::truncated_stream(0))?;
        Ok(buf)
    }

    /// Read a single ITF8-encoded integer from the external block.
    pub fn read_itf8(&mut self) -> Result<i32> {
        read_itf8(&mut self.reader)
    }

    /// Consume this codec and return the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_raw_bytes_in_order() {
        let mut codec = ExternalCodec::new(Cursor::new(vec![1, 2, 3, 4]));
        assert_eq!(codec.read_byte().unwrap(), 1);
        assert_eq!(codec.read_bytes(2).unwrap(), vec![2, 3]);
        assert_eq!(codec.read_byte().unwrap(), 4);
    }

    #[test]
    fn truncated_block_errors() {
        let mut codec = ExternalCodec::new(Cursor::new(vec![1]));
        assert!(codec.read_bytes(5).is_err());
    }
}
