use crate::error::Result;

use super::uleb128;

/// Decodes a zigzag ULEB128-encoded integer, returning it and the number of
/// bytes consumed.
pub fn decode(values: &[u8]) -> Result<(i64, usize)> {
    let (u, consumed) = uleb128::decode(values)?;
    Ok(((u >> 1) as i64 ^ -((u & 1) as i64), consumed))
}
