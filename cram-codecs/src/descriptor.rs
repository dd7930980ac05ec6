//! Encoding descriptors: the compression header's per-series codec tags and
//! parameters, and the dispatch from a deserialized descriptor to a live
//! codec instance.
//!
//! Realized as a closed tagged union per the design notes rather than
//! runtime polymorphism: the encoding-id to codec mapping is known and
//! finite, so a `match` replaces a vtable.

use crate::beta::BetaCodec;
use crate::golomb::GolombCodec;
use crate::huffman::HuffmanCodec;
use cram_core::error::{CramError, Result};
use cram_core::itf8::{read_itf8, read_itf8_array, write_itf8};
use std::io::Read;

/// Raw encoding id as it appears on the wire, before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum EncodingId {
    /// Canonical Huffman over an integer series.
    HuffmanInt = 0,
    /// Canonical Huffman over a byte series.
    HuffmanByte = 1,
    /// Fixed-width with offset.
    Beta = 2,
    /// Unary-quotient / truncated-binary remainder.
    Golomb = 3,
    /// Raw passthrough from a side-channel block.
    External = 4,
    /// A value sub-encoding applied `len` times, where `len` comes from its own sub-encoding.
    ByteArrayLen = 5,
    /// A byte sequence terminated by a sentinel stop byte.
    ByteArrayStop = 6,
}

impl EncodingId {
    fn from_wire(id: i32) -> Result<Self> {
        Ok(match id {
            0 => Self::HuffmanInt,
            1 => Self::HuffmanByte,
            2 => Self::Beta,
            3 => Self::Golomb,
            4 => Self::External,
            5 => Self::ByteArrayLen,
            6 => Self::ByteArrayStop,
            other => return Err(CramError::unsupported_encoding(other, "<descriptor>")),
        })
    }
}

/// A deserialized encoding descriptor: codec tag plus its parameters.
///
/// `ByteArrayLen` nests two further descriptors (length, then value); all
/// others carry only scalar parameters.
#[derive(Debug, Clone)]
pub enum EncodingDescriptor {
    /// Huffman over an integer alphabet.
    HuffmanInt {
        /// Alphabet values.
        values: Vec<i32>,
        /// Per-symbol bit lengths, same order as `values`.
        bit_lengths: Vec<u32>,
    },
    /// Huffman over a byte alphabet (`0..256`).
    HuffmanByte {
        /// Alphabet values.
        values: Vec<u8>,
        /// Per-symbol bit lengths, same order as `values`.
        bit_lengths: Vec<u32>,
    },
    /// Fixed-width with additive offset.
    Beta {
        /// Additive offset.
        offset: i32,
        /// Width in bits, `1..=32`.
        bit_limit: u32,
    },
    /// Unary quotient / truncated-binary remainder.
    Golomb {
        /// Additive offset.
        offset: i32,
        /// Golomb modulus, `>= 1`.
        m: u32,
    },
    /// Raw bytes from the named external block.
    External {
        /// Content id of the slice's external block to read from.
        block_content_id: i32,
    },
    /// Length-prefixed byte array: one sub-encoding yields the length, a
    /// second yields each element.
    ByteArrayLen {
        /// Sub-encoding that decodes the element count.
        len_encoding: Box<EncodingDescriptor>,
        /// Sub-encoding applied once per element.
        val_encoding: Box<EncodingDescriptor>,
    },
    /// Byte array terminated by a sentinel.
    ByteArrayStop {
        /// Sentinel byte marking the end of the array.
        stop_byte: u8,
        /// Content id of the external block holding the bytes.
        external_block_content_id: i32,
    },
}

impl EncodingDescriptor {
    /// Deserialize `(id, param_bytes)` from the compression header, per
    /// §4.4/§6: ITF8 id, ITF8 param length, then param bytes.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let raw_id = read_itf8(reader)?;
        let id = EncodingId::from_wire(raw_id)?;
        let param_len = read_itf8(reader)?;
        if param_len < 0 {
            return Err(CramError::malformed_stream("negative encoding param length"));
        }
        let mut params = vec![0u8; param_len as usize];
        reader
            .read_exact(&mut params)
            .map_err(|_| CramError::truncated_stream(0))?;

        let mut cursor = std::io::Cursor::new(params);
        Self::read_params(id, &mut cursor)
    }

    fn read_params(id: EncodingId, reader: &mut std::io::Cursor<Vec<u8>>) -> Result<Self> {
        Ok(match id {
            EncodingId::HuffmanInt => {
                let values = read_itf8_array(reader)?;
                let bit_lengths: Vec<u32> = read_itf8_array(reader)?
                    .into_iter()
                    .map(|v| v as u32)
                    .collect();
                Self::HuffmanInt { values, bit_lengths }
            }
            EncodingId::HuffmanByte => {
                let values: Vec<u8> = read_itf8_array(reader)?
                    .into_iter()
                    .map(|v| v as u8)
                    .collect();
                let bit_lengths: Vec<u32> = read_itf8_array(reader)?
                    .into_iter()
                    .map(|v| v as u32)
                    .collect();
                Self::HuffmanByte { values, bit_lengths }
            }
            EncodingId::Beta => {
                let offset = read_itf8(reader)?;
                let bit_limit = read_itf8(reader)? as u32;
                Self::Beta { offset, bit_limit }
            }
            EncodingId::Golomb => {
                let offset = read_itf8(reader)?;
                let m = read_itf8(reader)? as u32;
                Self::Golomb { offset, m }
            }
            EncodingId::External => {
                let block_content_id = read_itf8(reader)?;
                Self::External { block_content_id }
            }
            EncodingId::ByteArrayLen => {
                let len_encoding = Box::new(EncodingDescriptor::read(reader)?);
                let val_encoding = Box::new(EncodingDescriptor::read(reader)?);
                Self::ByteArrayLen {
                    len_encoding,
                    val_encoding,
                }
            }
            EncodingId::ByteArrayStop => {
                let stop_byte = read_itf8(reader)? as u8;
                let external_block_content_id = read_itf8(reader)?;
                Self::ByteArrayStop {
                    stop_byte,
                    external_block_content_id,
                }
            }
        })
    }

    /// Serialize this descriptor's `(id, param_bytes)` wire form.
    pub fn write(&self, out: &mut Vec<u8>) {
        let mut params = Vec::new();
        let id = match self {
            Self::HuffmanInt { values, bit_lengths } => {
                write_itf8(values.len() as i32, &mut params);
                for v in values {
                    write_itf8(*v, &mut params);
                }
                write_itf8(bit_lengths.len() as i32, &mut params);
                for b in bit_lengths {
                    write_itf8(*b as i32, &mut params);
                }
                EncodingId::HuffmanInt
            }
            Self::HuffmanByte { values, bit_lengths } => {
                write_itf8(values.len() as i32, &mut params);
                for v in values {
                    write_itf8(*v as i32, &mut params);
                }
                write_itf8(bit_lengths.len() as i32, &mut params);
                for b in bit_lengths {
                    write_itf8(*b as i32, &mut params);
                }
                EncodingId::HuffmanByte
            }
            Self::Beta { offset, bit_limit } => {
                write_itf8(*offset, &mut params);
                write_itf8(*bit_limit as i32, &mut params);
                EncodingId::Beta
            }
            Self::Golomb { offset, m } => {
                write_itf8(*offset, &mut params);
                write_itf8(*m as i32, &mut params);
                EncodingId::Golomb
            }
            Self::External { block_content_id } => {
                write_itf8(*block_content_id, &mut params);
                EncodingId::External
            }
            Self::ByteArrayLen {
                len_encoding,
                val_encoding,
            } => {
                len_encoding.write(&mut params);
                val_encoding.write(&mut params);
                EncodingId::ByteArrayLen
            }
            Self::ByteArrayStop {
                stop_byte,
                external_block_content_id,
            } => {
                write_itf8(*stop_byte as i32, &mut params);
                write_itf8(*external_block_content_id, &mut params);
                EncodingId::ByteArrayStop
            }
        };

        write_itf8(id as i32, out);
        write_itf8(params.len() as i32, out);
        out.extend_from_slice(&params);
    }

    /// Build the live codec this descriptor names, for the integer/byte
    /// codecs that operate directly over a bit stream (Beta, Golomb,
    /// Huffman). `External` and the byte-array variants are instantiated by
    /// the slice parser directly against their block buffers, since they
    /// need access to slice-local byte channels this type doesn't carry.
    pub fn build_bitstream_codec(&self) -> Result<BitstreamCodec> {
        match self {
            Self::HuffmanInt { values, bit_lengths } => {
                Ok(BitstreamCodec::HuffmanInt(HuffmanCodec::new(values, bit_lengths)?))
            }
            Self::HuffmanByte { values, bit_lengths } => Ok(BitstreamCodec::HuffmanByte(
                HuffmanCodec::new_byte(values, bit_lengths)?,
            )),
            Self::Beta { offset, bit_limit } => {
                Ok(BitstreamCodec::Beta(BetaCodec::new(*offset, *bit_limit)?))
            }
            Self::Golomb { offset, m } => Ok(BitstreamCodec::Golomb(GolombCodec::new(*m, *offset)?)),
            Self::External { .. } | Self::ByteArrayLen { .. } | Self::ByteArrayStop { .. } => {
                Err(CramError::malformed_stream(
                    "this encoding is not a direct bit-stream codec",
                ))
            }
        }
    }
}

/// A constructed bit-stream codec, ready to decode/encode integers.
#[derive(Debug, Clone)]
pub enum BitstreamCodec {
    /// Canonical Huffman, integer alphabet.
    HuffmanInt(HuffmanCodec),
    /// Canonical Huffman, byte alphabet.
    HuffmanByte(HuffmanCodec),
    /// Fixed-width with offset.
    Beta(BetaCodec),
    /// Unary quotient / truncated-binary remainder.
    Golomb(GolombCodec),
}

impl BitstreamCodec {
    /// Decode the next integer from `bis`, dispatching to the concrete codec.
    pub fn read_integer<R: Read>(&self, bis: &mut cram_core::bitstream::BitReader<R>) -> Result<i32> {
        match self {
            Self::HuffmanInt(c) | Self::HuffmanByte(c) => c.read(bis),
            Self::Beta(c) => c.read(bis),
            Self::Golomb(c) => c.read(bis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huffman_int_descriptor_roundtrip() {
        let desc = EncodingDescriptor::HuffmanInt {
            values: vec![1, 2, 3],
            bit_lengths: vec![1, 2, 2],
        };
        let mut buf = Vec::new();
        desc.write(&mut buf);
        let parsed = EncodingDescriptor::read(&mut std::io::Cursor::new(buf)).unwrap();
        match parsed {
            EncodingDescriptor::HuffmanInt { values, bit_lengths } => {
                assert_eq!(values, vec![1, 2, 3]);
                assert_eq!(bit_lengths, vec![1, 2, 2]);
            }
            other => panic!("unexpected descriptor: {other:?}"),
        }
    }

    #[test]
    fn beta_descriptor_roundtrip() {
        let desc = EncodingDescriptor::Beta {
            offset: -5,
            bit_limit: 4,
        };
        let mut buf = Vec::new();
        desc.write(&mut buf);
        let parsed = EncodingDescriptor::read(&mut std::io::Cursor::new(buf)).unwrap();
        assert!(matches!(
            parsed,
            EncodingDescriptor::Beta {
                offset: -5,
                bit_limit: 4
            }
        ));
    }

    #[test]
    fn byte_array_len_nests_two_descriptors() {
        let desc = EncodingDescriptor::ByteArrayLen {
            len_encoding: Box::new(EncodingDescriptor::External { block_content_id: 1 }),
            val_encoding: Box::new(EncodingDescriptor::External { block_content_id: 2 }),
        };
        let mut buf = Vec::new();
        desc.write(&mut buf);
        let parsed = EncodingDescriptor::read(&mut std::io::Cursor::new(buf)).unwrap();
        match parsed {
            EncodingDescriptor::ByteArrayLen {
                len_encoding,
                val_encoding,
            } => {
                assert!(matches!(
                    *len_encoding,
                    EncodingDescriptor::External { block_content_id: 1 }
                ));
                assert!(matches!(
                    *val_encoding,
                    EncodingDescriptor::External { block_content_id: 2 }
                ));
            }
            other => panic!("unexpected descriptor: {other:?}"),
        }
    }

    #[test]
    fn unknown_id_is_unsupported_encoding() {
        let mut buf = Vec::new();
        write_itf8(99, &mut buf);
        write_itf8(0, &mut buf);
        assert!(matches!(
            EncodingDescriptor::read(&mut std::io::Cursor::new(buf)),
            Err(CramError::UnsupportedEncoding { id: 99, .. })
        ));
    }
}
