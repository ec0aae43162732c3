//! Decoder of the `DELTA_LENGTH_BYTE_ARRAY` encoding: delta-encoded lengths
//! followed by the concatenated values.
//! See <https://github.com/apache/parquet-format/blob/master/Encodings.md#delta-length-byte-array-delta_length_byte_array--6>

use crate::error::{Error, Result};

use super::delta_bitpacked;

/// Decodes the lengths; [`Decoder::into_values`] returns the concatenated
/// values once all lengths were consumed.
/// # Implementation
/// This struct does not allocate on the heap.
#[derive(Debug)]
pub struct Decoder<'a> {
    values: &'a [u8],
    lengths: delta_bitpacked::Decoder<'a>,
    total_length: usize,
}

impl<'a> Decoder<'a> {
    pub fn try_new(values: &'a [u8]) -> Result<Self> {
        let lengths = delta_bitpacked::Decoder::try_new(values)?;
        Ok(Self {
            values,
            lengths,
            total_length: 0,
        })
    }

    /// Consumes this decoder and returns the slice of concatenated values.
    /// # Errors
    /// Errors when the lengths were not fully consumed or the values overrun
    /// the buffer.
    pub fn into_values(self) -> Result<&'a [u8]> {
        if self.lengths.size_hint().0 != 0 {
            return Err(Error::oos("lengths not fully consumed"));
        }
        let start = self.lengths.consumed_bytes();
        self.values
            .get(start..start + self.total_length)
            .ok_or_else(|| Error::oos("concatenated values overrun the page"))
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        let length = self.lengths.next()?;
        match length {
            Ok(length) if length < 0 => {
                Some(Err(Error::DeltaDecode(format!("negative length {length}"))))
            }
            Ok(length) => {
                self.total_length += length as usize;
                Some(Ok(length))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Decodes a whole `DELTA_LENGTH_BYTE_ARRAY` region into owned byte arrays.
pub fn decode(values: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut decoder = Decoder::try_new(values)?;
    let lengths = decoder.by_ref().collect::<Result<Vec<_>>>()?;
    let mut concatenated = decoder.into_values()?;

    lengths
        .into_iter()
        .map(|length| {
            let (value, remainder) = concatenated.split_at(length as usize);
            concatenated = remainder;
            Ok(value.to_vec())
        })
        .collect()
}
