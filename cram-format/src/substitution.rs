//! The substitution matrix: `(ref_base, code) -> alt_base`, loaded from the
//! compression header's preservation map.

use cram_core::error::{CramError, Result};
use std::io::Read;

const BASES: [u8; 5] = [b'A', b'C', b'G', b'T', b'N'];

fn base_index(base: u8) -> Option<usize> {
    BASES.iter().position(|&b| b == base.to_ascii_uppercase())
}

/// Per-reference-base substitution alphabet: for each of the five bases
/// `ACGTN`, a 4-entry table mapping a 2-bit code to the substituted base.
///
/// Both directions are precomputed at load time: `code_to_base` for
/// decoding, `base_to_code` for anything that needs to re-derive a code
/// (e.g. round-trip tests).
#[derive(Debug, Clone)]
pub struct SubstitutionMatrix {
    code_to_base: [[u8; 4]; 5],
    base_to_code: [[Option<u8>; 256]; 5],
}

impl SubstitutionMatrix {
    /// Build from the 5x4 wire table exactly as stored in the compression
    /// header: one row per reference base in `ACGTN` order, four alternate
    /// bases per row in code order.
    pub fn from_table(table: [[u8; 4]; 5]) -> Self {
        let mut base_to_code = [[None; 256]; 5];
        for (row, alts) in table.iter().enumerate() {
            for (code, &alt) in alts.iter().enumerate() {
                base_to_code[row][alt as usize] = Some(code as u8);
            }
        }
        Self {
            code_to_base: table,
            base_to_code,
        }
    }

    /// Read the 5x4 table from the compression header (one byte per cell,
    /// row-major in `ACGTN` order).
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; 20];
        reader
            .read_exact(&mut raw)
            .map_err(|_| CramError::truncated_stream(0))?;
        let mut table = [[0u8; 4]; 5];
        for (row, chunk) in raw.chunks_exact(4).enumerate() {
            table[row].copy_from_slice(chunk);
        }
        Ok(Self::from_table(table))
    }

    /// Resolve `(ref_base, code)` to the substituted base.
    pub fn base(&self, ref_base: u8, code: u8) -> Result<u8> {
        let row = base_index(ref_base)
            .ok_or_else(|| CramError::malformed_stream(format!("non-IUPAC reference base {ref_base}")))?;
        self.code_to_base
            .get(row)
            .and_then(|codes| codes.get(code as usize))
            .copied()
            .ok_or_else(|| CramError::symbol_not_in_alphabet(code as i32))
    }

    /// Resolve `(ref_base, alt_base)` back to its substitution code, the
    /// inverse of [`Self::base`].
    pub fn code(&self, ref_base: u8, alt_base: u8) -> Result<u8> {
        let row = base_index(ref_base)
            .ok_or_else(|| CramError::malformed_stream(format!("non-IUPAC reference base {ref_base}")))?;
        self.base_to_code[row][alt_base as usize]
            .ok_or_else(|| CramError::symbol_not_in_alphabet(alt_base as i32))
    }
}
