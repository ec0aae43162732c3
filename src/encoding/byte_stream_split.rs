//! Decoder of the `BYTE_STREAM_SPLIT` encoding: one stream per byte of the
//! value width, concatenated.
//! See <https://github.com/apache/parquet-format/blob/master/Encodings.md#byte-stream-split-byte_stream_split--9>

use crate::error::{Error, Result};
use crate::types::{self, NativeType};

/// Decodes fixed-width native values scattered over `size_of::<T>()` streams.
/// # Implementation
/// This struct allocates a single value-sized buffer.
#[derive(Debug)]
pub struct Decoder<'a, T: NativeType> {
    values: &'a [u8],
    buffer: Vec<u8>,
    num_elements: usize,
    current: usize,
    element_type: std::marker::PhantomData<T>,
}

impl<'a, T: NativeType> Decoder<'a, T> {
    pub fn try_new(values: &'a [u8]) -> Result<Self> {
        if values.len() % T::SIZE != 0 {
            return Err(Error::oos("value buffer is not a multiple of the element size"));
        }
        Ok(Self {
            values,
            buffer: vec![0u8; T::SIZE],
            num_elements: values.len() / T::SIZE,
            current: 0,
            element_type: std::marker::PhantomData,
        })
    }
}

impl<'a, T: NativeType> Iterator for Decoder<'a, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.num_elements {
            return None;
        }
        for stream in 0..T::SIZE {
            self.buffer[stream] = self.values[self.num_elements * stream + self.current];
        }
        self.current += 1;
        Some(types::decode(&self.buffer))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.num_elements - self.current;
        (remaining, Some(remaining))
    }
}

/// Decodes byte-stream-split FIXED_LEN_BYTE_ARRAY values of width `size`.
pub fn decode_fixed(values: &[u8], size: usize) -> Result<Vec<Vec<u8>>> {
    if size == 0 || values.len() % size != 0 {
        return Err(Error::oos("value buffer is not a multiple of the element size"));
    }
    let num_elements = values.len() / size;
    Ok((0..num_elements)
        .map(|i| {
            (0..size)
                .map(|stream| values[num_elements * stream + i])
                .collect()
        })
        .collect())
}
