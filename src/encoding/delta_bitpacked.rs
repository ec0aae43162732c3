//! Decoder of the `DELTA_BINARY_PACKED` encoding.
//! See <https://github.com/apache/parquet-format/blob/master/Encodings.md#delta-encoding-delta_binary_packed--5>

use crate::error::{Error, Result};

use super::{bitpacked, ceil8, uleb128, zigzag_leb128};

#[derive(Debug)]
struct Block<'a> {
    // the minimum delta, added to every unpacked delta of this block
    min_delta: i64,
    values_per_mini_block: usize,
    bitwidths: &'a [u8],
    values: &'a [u8],
    // number of deltas still to be read from this block
    remaining: usize,
    // invariant: <= values_per_mini_block
    current_index: usize,
    // None represents a miniblock of bit width 0
    current_miniblock: Option<bitpacked::Decoder<'a, u64>>,
    consumed_bytes: usize,
}

impl<'a> Block<'a> {
    fn try_new(
        mut values: &'a [u8],
        num_mini_blocks: usize,
        values_per_mini_block: usize,
        length: usize,
    ) -> Result<Self> {
        let length = std::cmp::min(length, num_mini_blocks * values_per_mini_block);

        let mut consumed_bytes = 0;
        let (min_delta, consumed) = zigzag_leb128::decode(values)?;
        consumed_bytes += consumed;
        values = &values[consumed..];

        if values.len() < num_mini_blocks {
            return Err(Error::DeltaDecode("block ends mid-header".to_string()));
        }
        let bitwidths = &values[..num_mini_blocks];
        consumed_bytes += num_mini_blocks;
        values = &values[num_mini_blocks..];

        let mut block = Block {
            min_delta,
            values_per_mini_block,
            bitwidths,
            values,
            remaining: length,
            current_index: 0,
            current_miniblock: None,
            consumed_bytes,
        };
        if length > 0 {
            block.advance_miniblock()?;
        }
        Ok(block)
    }

    fn advance_miniblock(&mut self) -> Result<()> {
        let num_bits = *self
            .bitwidths
            .first()
            .ok_or_else(|| Error::DeltaDecode("miniblock widths exhausted".to_string()))?
            as usize;
        self.bitwidths = &self.bitwidths[1..];

        self.current_miniblock = if num_bits > 0 {
            if num_bits > 64 {
                return Err(Error::DeltaDecode(format!(
                    "miniblock bit width {num_bits} above 64"
                )));
            }
            let length = std::cmp::min(self.remaining, self.values_per_mini_block);

            // a miniblock is always stored whole, padded to its full width
            let miniblock_length = ceil8(self.values_per_mini_block * num_bits);
            if self.values.len() < miniblock_length {
                return Err(Error::DeltaDecode("miniblock overruns the buffer".to_string()));
            }
            let (miniblock, remainder) = self.values.split_at(miniblock_length);

            self.values = remainder;
            self.consumed_bytes += miniblock_length;

            Some(bitpacked::Decoder::try_new(miniblock, num_bits, length)?)
        } else {
            None
        };
        self.current_index = 0;
        Ok(())
    }
}

impl<'a> Iterator for Block<'a> {
    type Item = Result<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let unpacked = self
            .current_miniblock
            .as_mut()
            .and_then(|x| x.next())
            .unwrap_or(0);
        let result = self.min_delta.wrapping_add(unpacked as i64);
        self.current_index += 1;
        self.remaining -= 1;

        if self.remaining > 0 && self.current_index == self.values_per_mini_block {
            if let Err(e) = self.advance_miniblock() {
                self.remaining = 0;
                return Some(Err(e));
            }
        }

        Some(Ok(result))
    }
}

/// Decoder of `DELTA_BINARY_PACKED`. Implements `Iterator<Item = Result<i64>>`.
/// # Implementation
/// This struct does not allocate on the heap.
#[derive(Debug)]
pub struct Decoder<'a> {
    num_mini_blocks: usize,
    values_per_mini_block: usize,
    // number of values still to emit
    total_count: usize,
    // the running value
    first_value: i64,
    values: &'a [u8],
    current_block: Option<Block<'a>>,
    // bytes consumed, excluding those of `current_block`
    consumed_bytes: usize,
}

impl<'a> Decoder<'a> {
    pub fn try_new(mut values: &'a [u8]) -> Result<Self> {
        let mut consumed_bytes = 0;
        let (block_size, consumed) = uleb128::decode(values)?;
        consumed_bytes += consumed;
        values = &values[consumed..];
        if block_size == 0 || block_size % 128 != 0 {
            return Err(Error::DeltaDecode(format!(
                "block size {block_size} is not a non-zero multiple of 128"
            )));
        }

        let (num_mini_blocks, consumed) = uleb128::decode(values)?;
        let num_mini_blocks = num_mini_blocks as usize;
        consumed_bytes += consumed;
        values = &values[consumed..];
        if num_mini_blocks == 0 {
            return Err(Error::DeltaDecode("zero miniblocks per block".to_string()));
        }

        let (total_count, consumed) = uleb128::decode(values)?;
        let total_count = total_count as usize;
        consumed_bytes += consumed;
        values = &values[consumed..];

        let (first_value, consumed) = zigzag_leb128::decode(values)?;
        consumed_bytes += consumed;
        values = &values[consumed..];

        let values_per_mini_block = block_size as usize / num_mini_blocks;
        if values_per_mini_block % 8 != 0 {
            return Err(Error::DeltaDecode(format!(
                "{values_per_mini_block} values per miniblock is not a multiple of 8"
            )));
        }

        // the first value is stored in the header; blocks hold total_count - 1 deltas
        let deltas = total_count.saturating_sub(1);
        let current_block = if deltas > 0 {
            Some(Block::try_new(
                values,
                num_mini_blocks,
                values_per_mini_block,
                deltas,
            )?)
        } else {
            None
        };

        Ok(Self {
            num_mini_blocks,
            values_per_mini_block,
            total_count,
            first_value,
            values,
            current_block,
            consumed_bytes,
        })
    }

    /// The total number of bytes consumed by this decoder up to this point.
    pub fn consumed_bytes(&self) -> usize {
        self.consumed_bytes
            + self
                .current_block
                .as_ref()
                .map(|block| block.consumed_bytes)
                .unwrap_or(0)
    }

    fn next_delta(&mut self) -> Result<i64> {
        loop {
            let block = self
                .current_block
                .as_mut()
                .ok_or_else(|| Error::DeltaDecode("deltas exhausted".to_string()))?;
            match block.next() {
                Some(delta) => return delta,
                None => {
                    // roll over to the next block
                    let consumed = block.consumed_bytes;
                    self.consumed_bytes += consumed;
                    self.values = &self.values[consumed..];
                    self.current_block = Some(Block::try_new(
                        self.values,
                        self.num_mini_blocks,
                        self.values_per_mini_block,
                        self.total_count,
                    )?);
                }
            }
        }
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.total_count == 0 {
            return None;
        }
        self.total_count -= 1;
        let result = self.first_value;

        if self.total_count > 0 {
            match self.next_delta() {
                Ok(delta) => self.first_value = self.first_value.wrapping_add(delta),
                Err(e) => {
                    self.total_count = 0;
                    return Some(Err(e));
                }
            }
        }
        Some(Ok(result))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.total_count, Some(self.total_count))
    }
}
