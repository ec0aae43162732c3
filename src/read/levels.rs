//! Splitting of data page buffers into (repetition levels, definition levels,
//! values) regions.

use crate::encoding::get_length;
use crate::error::{Error, Result};

/// Splits a v1 page buffer. Each present level region is prefixed by its own
/// `u32` length.
pub fn split_buffer_v1(
    buffer: &[u8],
    has_rep: bool,
    has_def: bool,
) -> Result<(&[u8], &[u8], &[u8])> {
    let (rep, buffer) = if has_rep {
        split_length_prefixed(buffer)?
    } else {
        (&[] as &[u8], buffer)
    };
    let (def, buffer) = if has_def {
        split_length_prefixed(buffer)?
    } else {
        (&[] as &[u8], buffer)
    };
    Ok((rep, def, buffer))
}

fn split_length_prefixed(buffer: &[u8]) -> Result<(&[u8], &[u8])> {
    let length = get_length(buffer)? as usize;
    if buffer.len() < 4 + length {
        return Err(Error::oos("level region overruns the page"));
    }
    Ok((&buffer[4..4 + length], &buffer[4 + length..]))
}

/// Splits a v2 page buffer. Level byte lengths come from the page header and
/// the regions carry no length prefix.
pub fn split_buffer_v2(
    buffer: &[u8],
    rep_levels_byte_length: usize,
    def_levels_byte_length: usize,
) -> Result<(&[u8], &[u8], &[u8])> {
    let def_end = rep_levels_byte_length + def_levels_byte_length;
    if buffer.len() < def_end {
        return Err(Error::oos("level regions overrun the page"));
    }
    Ok((
        &buffer[..rep_levels_byte_length],
        &buffer[rep_levels_byte_length..def_end],
        &buffer[def_end..],
    ))
}
