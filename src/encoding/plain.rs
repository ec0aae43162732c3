//! Readers of the PLAIN encoding.

use crate::error::{Error, Result};
use crate::types::{self, NativeType};

/// Bit-packed booleans, LSB first, `ceil(count / 8)` bytes.
pub fn read_bools(values: &[u8], count: usize) -> Result<Vec<bool>> {
    if values.len() * 8 < count {
        return Err(Error::oos("boolean buffer too short"));
    }
    Ok((0..count)
        .map(|i| values[i / 8] & (1 << (i % 8)) != 0)
        .collect())
}

/// Contiguous little-endian fixed-width values.
pub fn read_native<T: NativeType>(values: &[u8], count: usize) -> Result<Vec<T>> {
    let needed = count * T::SIZE;
    let values = values
        .get(..needed)
        .ok_or_else(|| Error::oos("native value buffer too short"))?;
    Ok(values.chunks_exact(T::SIZE).map(types::decode).collect())
}

/// `u32` length-prefixed byte arrays.
pub fn read_byte_arrays(mut values: &[u8], count: usize) -> Result<Vec<Vec<u8>>> {
    (0..count)
        .map(|_| {
            let length: [u8; 4] = values
                .get(..4)
                .ok_or_else(|| Error::oos("byte array buffer too short"))?
                .try_into()
                .unwrap();
            let length = u32::from_le_bytes(length) as usize;
            let value = values
                .get(4..4 + length)
                .ok_or_else(|| Error::oos("byte array overruns the buffer"))?;
            values = &values[4 + length..];
            Ok(value.to_vec())
        })
        .collect()
}

/// `size` bytes per value.
pub fn read_fixed(values: &[u8], size: usize, count: usize) -> Result<Vec<Vec<u8>>> {
    if size == 0 {
        return Err(Error::oos("fixed length byte array of width 0"));
    }
    let needed = count * size;
    let values = values
        .get(..needed)
        .ok_or_else(|| Error::oos("fixed length buffer too short"))?;
    Ok(values.chunks_exact(size).map(|chunk| chunk.to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bools_lsb_first() {
        let values = read_bools(&[0b0000_0101], 3).unwrap();
        assert_eq!(values, vec![true, false, true]);
        assert!(read_bools(&[0b0000_0101], 9).is_err());
    }

    #[test]
    fn native_i32() {
        let data = [1i32, -1, 7]
            .iter()
            .flat_map(|x| x.to_le_bytes())
            .collect::<Vec<_>>();
        assert_eq!(read_native::<i32>(&data, 3).unwrap(), vec![1, -1, 7]);
        assert!(read_native::<i32>(&data, 4).is_err());
    }

    #[test]
    fn byte_arrays() {
        let data = [
            2, 0, 0, 0, b'h', b'i', 0, 0, 0, 0, 3, 0, 0, 0, b'f', b'o', b'o',
        ];
        let values = read_byte_arrays(&data, 3).unwrap();
        assert_eq!(values, vec![b"hi".to_vec(), vec![], b"foo".to_vec()]);
        assert!(read_byte_arrays(&data, 4).is_err());
    }

    #[test]
    fn fixed_width() {
        let data = [1u8, 2, 3, 4];
        assert_eq!(
            read_fixed(&data, 2, 2).unwrap(),
            vec![vec![1, 2], vec![3, 4]]
        );
    }

    #[test]
    fn int96_values() {
        let mut data = vec![];
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&3u32.to_le_bytes());
        assert_eq!(
            read_native::<[u32; 3]>(&data, 1).unwrap(),
            vec![[1, 2, 3]]
        );
    }
}
