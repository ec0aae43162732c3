//! Decoder of the `DELTA_BYTE_ARRAY` encoding: prefix lengths, suffix
//! lengths, then the concatenated suffixes. Each value shares a prefix with
//! its predecessor.
//! See <https://github.com/apache/parquet-format/blob/master/Encodings.md#delta-strings-delta_byte_array--7>

use crate::error::{Error, Result};

use super::{delta_bitpacked, delta_length_byte_array};

/// Decodes the prefix lengths; [`Decoder::into_lengths`] continues into the
/// suffix lengths and values.
/// # Implementation
/// This struct does not allocate on the heap.
#[derive(Debug)]
pub struct Decoder<'a> {
    values: &'a [u8],
    prefix_lengths: delta_bitpacked::Decoder<'a>,
}

impl<'a> Decoder<'a> {
    pub fn try_new(values: &'a [u8]) -> Result<Self> {
        let prefix_lengths = delta_bitpacked::Decoder::try_new(values)?;
        Ok(Self {
            values,
            prefix_lengths,
        })
    }

    /// Consumes this decoder, moving onto the suffix lengths.
    /// # Errors
    /// Errors when the prefix lengths were not fully consumed.
    pub fn into_lengths(self) -> Result<delta_length_byte_array::Decoder<'a>> {
        if self.prefix_lengths.size_hint().0 != 0 {
            return Err(Error::oos("prefix lengths not fully consumed"));
        }
        delta_length_byte_array::Decoder::try_new(
            &self.values[self.prefix_lengths.consumed_bytes()..],
        )
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        self.prefix_lengths.next()
    }
}

/// Decodes a whole `DELTA_BYTE_ARRAY` region into owned byte arrays:
/// `value[i] = value[i-1][..prefix_len[i]] ++ suffix[i]`.
pub fn decode(values: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut decoder = Decoder::try_new(values)?;
    let prefix_lengths = decoder.by_ref().collect::<Result<Vec<_>>>()?;

    let mut lengths = decoder.into_lengths()?;
    let suffix_lengths = lengths.by_ref().collect::<Result<Vec<_>>>()?;
    let mut suffixes = lengths.into_values()?;

    if prefix_lengths.len() != suffix_lengths.len() {
        return Err(Error::oos("prefix and suffix counts differ"));
    }

    let mut out: Vec<Vec<u8>> = Vec::with_capacity(prefix_lengths.len());
    for (prefix_length, suffix_length) in prefix_lengths.into_iter().zip(suffix_lengths) {
        let prefix_length = prefix_length as usize;
        let (suffix, remainder) = suffixes.split_at(suffix_length as usize);
        suffixes = remainder;

        let mut value = Vec::with_capacity(prefix_length + suffix.len());
        match out.last() {
            Some(previous) if prefix_length > 0 => {
                let prefix = previous.get(..prefix_length).ok_or_else(|| {
                    Error::oos(format!("prefix length {prefix_length} overruns the previous value"))
                })?;
                value.extend_from_slice(prefix);
            }
            None if prefix_length > 0 => {
                return Err(Error::oos("first value cannot have a prefix"));
            }
            _ => {}
        }
        value.extend_from_slice(suffix);
        out.push(value);
    }
    Ok(out)
}
