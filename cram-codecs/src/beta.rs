//! Beta codec: fixed-width integers with an additive offset.

use cram_core::bitstream::{BitReader, BitWriter};
use cram_core::error::{CramError, Result};
use std::io::{Read, Write};

/// Fixed-width codec: `read() = read_bits(bit_limit) - offset`.
#[derive(Debug, Clone, Copy)]
pub struct BetaCodec {
    offset: i32,
    bit_limit: u32,
}

impl BetaCodec {
    /// Build a Beta codec. `bit_limit` must be in `1..=32`.
    pub fn new(offset: i32, bit_limit: u32) -> Result<Self> {
        if !(1..=32).contains(&bit_limit) {
            return Err(CramError::value_out_of_range(format!(
                "beta bit_limit {bit_limit} out of range 1..=32"
            )));
        }
        Ok(Self { offset, bit_limit })
    }

    /// Decode the next value.
    pub fn read<R: Read>(&self, bis: &mut BitReader<R>) -> Result<i32> {
        let raw = bis.read_bits(self.bit_limit)? as i64;
        Ok((raw - self.offset as i64) as i32)
    }

    /// Encode `value`, failing if `value + offset` does not fit in `bit_limit` bits.
    pub fn write<W: Write>(&self, bos: &mut BitWriter<W>, value: i32) -> Result<()> {
        let shifted = value as i64 + self.offset as i64;
        if shifted < 0 || (self.bit_limit < 64 && shifted >= (1i64 << self.bit_limit)) {
            return Err(CramError::value_out_of_range(format!(
                "beta value {value} with offset {} does not fit in {} bits",
                self.offset, self.bit_limit
            )));
        }
        bos.write_bits(shifted as u64, self.bit_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn roundtrip() {
        let codec = BetaCodec::new(-5, 4).unwrap();
        let mut out = Vec::new();
        {
            let mut writer = BitWriter::new(&mut out);
            for v in [-5, 0, 10] {
                codec.write(&mut writer, v).unwrap();
            }
        }
        let mut reader = BitReader::new(Cursor::new(out));
        for expected in [-5, 0, 10] {
            assert_eq!(codec.read(&mut reader).unwrap(), expected);
        }
    }

    #[test]
    fn overflow_is_value_out_of_range() {
        let codec = BetaCodec::new(0, 2).unwrap();
        assert!(matches!(
            codec.write(&mut BitWriter::new(Vec::new()), 10),
            Err(CramError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn invalid_bit_limit_rejected() {
        assert!(BetaCodec::new(0, 0).is_err());
        assert!(BetaCodec::new(0, 33).is_err());
    }
}
