//! Decoders of the parquet encodings.

use crate::error::{Error, Result};

pub mod bitpacked;
pub mod byte_stream_split;
pub mod delta_bitpacked;
pub mod delta_byte_array;
pub mod delta_length_byte_array;
pub mod hybrid_rle;
pub mod plain;
pub mod uleb128;
pub mod zigzag_leb128;

/// The encoding of a page.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum Encoding {
    /// Default encoding: raw values, little-endian; booleans bit-packed.
    Plain,
    /// Deprecated dictionary encoding; in a data page use RLE_DICTIONARY
    /// instead, in a dictionary page use PLAIN instead.
    PlainDictionary,
    /// Group packed run length encoding. Usable for definition/repetition
    /// levels and booleans.
    Rle,
    /// Deprecated bit-packed-only encoding for levels.
    BitPacked,
    /// Delta encoding for integers; works best on sorted data.
    DeltaBinaryPacked,
    /// Byte arrays with DELTA_BINARY_PACKED lengths up front.
    DeltaLengthByteArray,
    /// Incremental-encoded byte arrays: shared prefixes plus suffixes.
    DeltaByteArray,
    /// Dictionary indices encoded with the RLE encoding.
    RleDictionary,
    /// One byte-stream per byte of the value width; improves downstream
    /// compression of floating-point data.
    ByteStreamSplit,
}

impl Encoding {
    pub(crate) fn try_new(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Encoding::Plain,
            2 => Encoding::PlainDictionary,
            3 => Encoding::Rle,
            4 => Encoding::BitPacked,
            5 => Encoding::DeltaBinaryPacked,
            6 => Encoding::DeltaLengthByteArray,
            7 => Encoding::DeltaByteArray,
            8 => Encoding::RleDictionary,
            9 => Encoding::ByteStreamSplit,
            _ => return Err(Error::oos(format!("encoding {value} out of range"))),
        })
    }
}

/// Reads the little-endian `u32` length prefix of a standalone
/// RLE/bit-packed region.
pub fn get_length(values: &[u8]) -> Result<u32> {
    let bytes: [u8; 4] = values
        .get(0..4)
        .ok_or_else(|| Error::oos("missing u32 length prefix"))?
        .try_into()
        .unwrap();
    Ok(u32::from_le_bytes(bytes))
}

/// Returns the ceil of value/8.
#[inline]
pub fn ceil8(value: usize) -> usize {
    value / 8 + ((value % 8 != 0) as usize)
}

/// Number of bits needed to represent `max`: `32 - clz(max)`, 0 for 0.
#[inline]
pub fn get_bit_width(max: u32) -> u32 {
    32 - max.leading_zeros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_width_table() {
        assert_eq!(get_bit_width(0), 0);
        assert_eq!(get_bit_width(1), 1);
        assert_eq!(get_bit_width(7), 3);
        assert_eq!(get_bit_width(8), 4);
        assert_eq!(get_bit_width(255), 8);
        assert_eq!(get_bit_width(256), 9);
        assert_eq!(get_bit_width(1_048_575), 20);
    }

    #[test]
    fn ceil8_basics() {
        assert_eq!(ceil8(0), 0);
        assert_eq!(ceil8(1), 1);
        assert_eq!(ceil8(8), 1);
        assert_eq!(ceil8(9), 2);
    }
}
