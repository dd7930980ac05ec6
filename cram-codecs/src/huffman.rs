//! Canonical Huffman codec for CRAM data series.
//!
//! CRAM's Huffman codec is parameterized per-series by a `(values, bit_lengths)`
//! pair taken straight from the compression header; there is no tree built at
//! decode time, only two sorted tables derived once at construction.

use cram_core::bitstream::{BitReader, BitWriter};
use cram_core::error::{CramError, Result};
use std::io::{Read, Write};

/// A single entry in a canonical Huffman codebook.
///
/// Invariant: `bit_length >= 1` for any alphabet with more than one symbol;
/// a one-symbol alphabet is the sole exception and carries `bit_length == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanBitCode {
    /// The symbol this code represents.
    pub symbol_value: i32,
    /// Number of bits in `bit_code`.
    pub bit_length: u8,
    /// The assigned canonical code, right-aligned.
    pub bit_code: u32,
}

/// Canonical Huffman codec over an `i32` alphabet (used directly by the
/// integer data series, and by the byte series after widening `u8 -> i32`).
#[derive(Debug, Clone)]
pub struct HuffmanCodec {
    /// Codes sorted by `(bit_length, symbol_value)`, matching decode rank order.
    sorted: Vec<HuffmanBitCode>,
    /// Sparse map from a left-aligned bit pattern to its rank in `sorted`, or `-1`.
    rank_by_code: Vec<i32>,
    /// `value_to_code[symbol]` for symbols in `0..value_to_code.len()`; used
    /// only by the byte variant's dense encode path. The general integer
    /// encode path scans `sorted` directly since the alphabet may be sparse
    /// or signed.
    value_to_code: Option<Vec<Option<HuffmanBitCode>>>,
}

impl HuffmanCodec {
    /// Build a codec for an arbitrary (possibly sparse, possibly negative)
    /// integer alphabet.
    pub fn new(values: &[i32], bit_lengths: &[u32]) -> Result<Self> {
        if values.len() != bit_lengths.len() {
            return Err(CramError::malformed_stream(
                "huffman alphabet and bit-length arrays differ in length",
            ));
        }

        let mut pairs: Vec<(i32, u32)> = values.iter().copied().zip(bit_lengths.iter().copied()).collect();
        pairs.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

        let sorted = assign_canonical_codes(&pairs)?;
        let rank_by_code = build_rank_table(&sorted);

        Ok(Self {
            sorted,
            rank_by_code,
            value_to_code: None,
        })
    }

    /// Build a codec for the byte data series: alphabet is `u8` widened to
    /// `i32` in `0..256`. Maintains a dense `value_to_code` table sized to
    /// 256 (see §9 open question: the canonical C++ implementation sizes
    /// this to 255 and would overflow on byte value 255).
    pub fn new_byte(values: &[u8], bit_lengths: &[u32]) -> Result<Self> {
        let values: Vec<i32> = values.iter().map(|&b| b as i32).collect();
        let mut codec = Self::new(&values, bit_lengths)?;

        let mut table: Vec<Option<HuffmanBitCode>> = vec![None; 256];
        for code in &codec.sorted {
            if (0..256).contains(&code.symbol_value) {
                table[code.symbol_value as usize] = Some(*code);
            }
        }
        codec.value_to_code = Some(table);
        Ok(codec)
    }

    /// Number of bits the codec would write for `symbol`.
    pub fn bits_for(&self, symbol: i32) -> Result<u32> {
        Ok(self.lookup_code(symbol)?.bit_length as u32)
    }

    fn lookup_code(&self, symbol: i32) -> Result<HuffmanBitCode> {
        if let Some(table) = &self.value_to_code {
            if (0..256).contains(&symbol) {
                if let Some(code) = table[symbol as usize] {
                    return Ok(code);
                }
            }
            return Err(CramError::symbol_not_in_alphabet(symbol));
        }

        self.sorted
            .iter()
            .find(|c| c.symbol_value == symbol)
            .copied()
            .ok_or(CramError::symbol_not_in_alphabet(symbol))
    }

    /// Encode `symbol`, returning the number of bits written.
    pub fn write<W: Write>(&self, bos: &mut BitWriter<W>, symbol: i32) -> Result<u32> {
        let code = self.lookup_code(symbol)?;
        bos.write_bits(code.bit_code as u64, code.bit_length as u32)?;
        Ok(code.bit_length as u32)
    }

    /// Decode the next symbol from `bis`.
    ///
    /// Implements §4.1's incremental-accumulation decode: bits are pulled in
    /// increasing-length increments and checked against the rank table after
    /// each extension, rather than probed one bit-length at a time from
    /// scratch.
    pub fn read<R: Read>(&self, bis: &mut BitReader<R>) -> Result<i32> {
        if self.sorted.len() == 1 && self.sorted[0].bit_length == 0 {
            return Ok(self.sorted[0].symbol_value);
        }

        let mut bits: u64 = 0;
        let mut prev_len: u8 = 0;
        let mut i = 0usize;
        while i < self.sorted.len() {
            let entry = self.sorted[i];
            let extra = entry.bit_length - prev_len;
            if extra > 0 {
                let more = bis.read_bits(extra as u32)?;
                bits = (bits << extra) | more;
            }
            prev_len = entry.bit_length;

            if (bits as usize) < self.rank_by_code.len() {
                let rank = self.rank_by_code[bits as usize];
                if rank >= 0 && self.sorted[rank as usize].bit_length == prev_len {
                    return Ok(self.sorted[rank as usize].symbol_value);
                }
            }

            // advance past all remaining codes of this same bit length; none
            // of them can match since the rank lookup above already missed
            let len = entry.bit_length;
            i += 1;
            while i < self.sorted.len() && self.sorted[i].bit_length == len {
                i += 1;
            }
        }

        Err(CramError::malformed_stream(
            "huffman decode fell through without a matching code",
        ))
    }
}

/// Group-sorted `(value, bit_length)` pairs in, assigned canonical codes out.
fn assign_canonical_codes(pairs: &[(i32, u32)]) -> Result<Vec<HuffmanBitCode>> {
    let mut out = Vec::with_capacity(pairs.len());

    // one-symbol alphabet: bit_length 0, code 0, per §4.1's edge case
    if pairs.len() == 1 {
        out.push(HuffmanBitCode {
            symbol_value: pairs[0].0,
            bit_length: 0,
            bit_code: 0,
        });
        return Ok(out);
    }

    let mut code_value: i64 = -1;
    let mut code_length: u32 = 0;

    for &(value, group_length) in pairs {
        code_value += 1;
        code_value <<= group_length - code_length;
        code_length = group_length;

        if (code_value as u32).count_ones() > group_length {
            return Err(CramError::malformed_stream(format!(
                "symbol {value} out of range: code overflows its {group_length}-bit length"
            )));
        }

        out.push(HuffmanBitCode {
            symbol_value: value,
            bit_length: group_length as u8,
            bit_code: code_value as u32,
        });
    }

    Ok(out)
}

fn build_rank_table(sorted: &[HuffmanBitCode]) -> Vec<i32> {
    let max_code = sorted.iter().map(|c| c.bit_code).max().unwrap_or(0);
    let mut table = vec![-1i32; max_code as usize + 1];
    for (rank, code) in sorted.iter().enumerate() {
        table[code.bit_code as usize] = rank as i32;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn one_symbol_alphabet_is_zero_bits() {
        let codec = HuffmanCodec::new(&[42], &[0]).unwrap();
        assert_eq!(codec.bits_for(42).unwrap(), 0);

        let mut out = Vec::new();
        {
            let mut writer = BitWriter::new(&mut out);
            for _ in 0..3 {
                codec.write(&mut writer, 42).unwrap();
            }
        }
        let mut reader = BitReader::new(Cursor::new(out));
        assert_eq!(codec.read(&mut reader).unwrap(), 42);
        assert_eq!(codec.read(&mut reader).unwrap(), 42);
        assert_eq!(codec.read(&mut reader).unwrap(), 42);
    }

    #[test]
    fn canonical_three_symbol_assignment() {
        // values=[1,2,3], bit_lengths=[1,2,2] => 1->0, 2->10, 3->11
        let codec = HuffmanCodec::new(&[1, 2, 3], &[1, 2, 2]).unwrap();
        assert_eq!(codec.lookup_code(1).unwrap().bit_code, 0b0);
        assert_eq!(codec.lookup_code(2).unwrap().bit_code, 0b10);
        assert_eq!(codec.lookup_code(3).unwrap().bit_code, 0b11);
    }

    #[test]
    fn three_symbol_roundtrip() {
        let codec = HuffmanCodec::new(&[1, 2, 3], &[1, 2, 2]).unwrap();
        let mut out = Vec::new();
        {
            let mut writer = BitWriter::new(&mut out);
            for sym in [1, 3, 2, 1] {
                codec.write(&mut writer, sym).unwrap();
            }
        }
        let mut reader = BitReader::new(Cursor::new(out));
        for expected in [1, 3, 2, 1] {
            assert_eq!(codec.read(&mut reader).unwrap(), expected);
        }
    }

    #[test]
    fn byte_variant_dense_table() {
        let codec = HuffmanCodec::new_byte(&[0, 255], &[1, 1]).unwrap();
        assert_eq!(codec.bits_for(255).unwrap(), 1);
        assert_eq!(codec.bits_for(0).unwrap(), 1);
    }

    #[test]
    fn encode_unknown_symbol_fails() {
        let codec = HuffmanCodec::new(&[1, 2], &[1, 1]).unwrap();
        assert!(matches!(
            codec.lookup_code(99),
            Err(CramError::SymbolNotInAlphabet { symbol: 99 })
        ));
    }

    #[test]
    fn mismatched_alphabet_lengths_error() {
        assert!(HuffmanCodec::new(&[1, 2], &[1]).is_err());
    }
}
