use crate::error::{Error, Result};

/// Decodes an ULEB128-encoded integer, returning it and the number of bytes
/// consumed.
pub fn decode(values: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0;
    let mut consumed = 0;

    for byte in values {
        let shift = consumed * 7;
        consumed += 1;
        if shift == 63 && *byte > 1 {
            return Err(Error::oos("uleb128 overflows u64"));
        }

        result |= u64::from(byte & 0x7F) << shift;

        if byte & 0x80 == 0 {
            return Ok((result, consumed));
        }
    }
    Err(Error::oos("uleb128 ends mid-integer"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_1() {
        let data = vec![0xE5, 0x8E, 0x26, 0xDE, 0xAD, 0xBE, 0xEF];
        let (value, consumed) = decode(&data).unwrap();
        assert_eq!(value, 624_485);
        assert_eq!(consumed, 3);
    }

    #[test]
    fn decode_2() {
        let data = vec![0b0001_0000, 0b0000_0001, 0b0000_0011, 0b0000_0011];
        let (value, consumed) = decode(&data).unwrap();
        assert_eq!(value, 16);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn decode_truncated() {
        assert!(decode(&[0x80]).is_err());
        assert!(decode(&[]).is_err());
    }
}
