//! Decoding of the RLE / bit-packing hybrid encoding, used for levels,
//! dictionary indices and booleans.
//! See <https://github.com/apache/parquet-format/blob/master/Encodings.md#run-length-encoding--bit-packing-hybrid-rle--3>

use crate::error::{Error, Result};

use super::{bitpacked, ceil8, get_length, uleb128};

/// One run of the hybrid encoding.
#[derive(Debug, PartialEq, Eq)]
pub enum HybridEncoded<'a> {
    /// A bit-packed group holding up to `compressed.len() * 8 / num_bits`
    /// values.
    Bitpacked(&'a [u8]),
    /// A value (in its minimal byte width) repeated `usize` times.
    Rle(&'a [u8], usize),
}

/// An [`Iterator`] of [`HybridEncoded`] runs.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    values: &'a [u8],
    num_bits: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(values: &'a [u8], num_bits: usize) -> Self {
        Self { values, num_bits }
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<HybridEncoded<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.values.is_empty() || self.num_bits == 0 {
            return None;
        }
        let (indicator, consumed) = match uleb128::decode(self.values) {
            Ok(x) => x,
            Err(e) => {
                self.values = &[];
                return Some(Err(e));
            }
        };
        self.values = &self.values[consumed..];
        if indicator & 1 == 1 {
            // bit-packed run: (indicator >> 1) groups of 8 values
            let bytes = (indicator as usize >> 1) * self.num_bits;
            // writers may pad the last group; surplus bytes beyond the buffer
            // do not exist and surplus values are discarded by the caller
            let bytes = std::cmp::min(bytes, self.values.len());
            let result = HybridEncoded::Bitpacked(&self.values[..bytes]);
            self.values = &self.values[bytes..];
            Some(Ok(result))
        } else {
            // RLE run: the repeated value in ceil8(num_bits) bytes
            let run_length = indicator as usize >> 1;
            let rle_bytes = ceil8(self.num_bits);
            if self.values.len() < rle_bytes {
                self.values = &[];
                return Some(Err(Error::oos("RLE run ends mid-value")));
            }
            let result = HybridEncoded::Rle(&self.values[..rle_bytes], run_length);
            self.values = &self.values[rle_bytes..];
            Some(Ok(result))
        }
    }
}

/// Decodes exactly `count` values from a hybrid-encoded region. Surplus
/// values of the last bit-packed group are padding and are discarded.
/// # Errors
/// Errors [`Error::BitpackOutOfBounds`] when the region holds fewer than
/// `count` values.
pub fn decode(values: &[u8], num_bits: u32, count: usize) -> Result<Vec<u32>> {
    let mut out = Vec::with_capacity(count);
    if count == 0 {
        return Ok(out);
    }
    if num_bits == 0 {
        out.resize(count, 0);
        return Ok(out);
    }
    if num_bits > 32 {
        return Err(Error::oos(format!("bit width {num_bits} out of range")));
    }
    for run in Decoder::new(values, num_bits as usize) {
        match run? {
            HybridEncoded::Bitpacked(packed) => {
                let available = packed.len() * 8 / num_bits as usize;
                let take = available.min(count - out.len());
                out.extend(bitpacked::Decoder::<u32>::try_new(
                    packed,
                    num_bits as usize,
                    take,
                )?);
            }
            HybridEncoded::Rle(value, run_length) => {
                let mut bytes = [0u8; 4];
                bytes[..value.len()].copy_from_slice(value);
                let value = u32::from_le_bytes(bytes);
                let take = run_length.min(count - out.len());
                out.extend(std::iter::repeat(value).take(take));
            }
        }
        if out.len() == count {
            return Ok(out);
        }
    }
    Err(Error::BitpackOutOfBounds)
}

/// Decodes a `u32`-length-prefixed hybrid region, returning the values and
/// the consumed size. The consumed size is always `4 + length` regardless of
/// how much of the region `count` values needed, since writers may pad it.
pub fn decode_length_prefixed(
    values: &[u8],
    num_bits: u32,
    count: usize,
) -> Result<(Vec<u32>, usize)> {
    let length = get_length(values)? as usize;
    let end = 4usize
        .checked_add(length)
        .filter(|end| *end <= values.len())
        .ok_or_else(|| Error::oos("RLE region length overruns the page"))?;
    let decoded = decode(&values[4..end], num_bits, count)?;
    Ok((decoded, end))
}
