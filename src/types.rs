/// A physical native representation of a parquet fixed-sized type.
pub trait NativeType: Sized + Copy + Default + std::fmt::Debug + Send + Sync + 'static {
    /// The size of the type in bytes.
    const SIZE: usize;

    type Bytes: AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    fn to_le_bytes(&self) -> Self::Bytes;

    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! native {
    ($type:ty) => {
        impl NativeType for $type {
            const SIZE: usize = std::mem::size_of::<Self>();
            type Bytes = [u8; std::mem::size_of::<Self>()];

            #[inline]
            fn to_le_bytes(&self) -> Self::Bytes {
                Self::to_le_bytes(*self)
            }

            #[inline]
            fn from_le_bytes(bytes: Self::Bytes) -> Self {
                Self::from_le_bytes(bytes)
            }
        }
    };
}

native!(i32);
native!(i64);
native!(f32);
native!(f64);

/// INT96: 12 bytes, the lower 64 bits carry the nanoseconds within the day,
/// the upper 32 bits carry the Julian day.
impl NativeType for [u32; 3] {
    const SIZE: usize = 12;
    type Bytes = [u8; 12];

    #[inline]
    fn to_le_bytes(&self) -> Self::Bytes {
        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&self[0].to_le_bytes());
        bytes[4..8].copy_from_slice(&self[1].to_le_bytes());
        bytes[8..12].copy_from_slice(&self[2].to_le_bytes());
        bytes
    }

    #[inline]
    fn from_le_bytes(bytes: Self::Bytes) -> Self {
        let mut first = [0u8; 4];
        first.copy_from_slice(&bytes[0..4]);
        let mut second = [0u8; 4];
        second.copy_from_slice(&bytes[4..8]);
        let mut third = [0u8; 4];
        third.copy_from_slice(&bytes[8..12]);
        [
            u32::from_le_bytes(first),
            u32::from_le_bytes(second),
            u32::from_le_bytes(third),
        ]
    }
}

/// Number of days between the Julian epoch and the Unix epoch (1970-01-01).
pub const JULIAN_DAY_OF_UNIX_EPOCH: i64 = 2_440_588;

/// Converts an INT96 into nanoseconds since the Unix epoch, using the full
/// 96-bit split: the upper 32 bits are the Julian day and the lower 64 bits
/// are the nanoseconds within that day.
#[inline]
pub fn int96_to_i64_ns(value: [u32; 3]) -> i64 {
    const SECONDS_PER_DAY: i64 = 86_400;
    const NANOS_PER_SECOND: i64 = 1_000_000_000;

    let days = value[2] as i64 - JULIAN_DAY_OF_UNIX_EPOCH;
    let nanos = ((value[1] as i64) << 32) + value[0] as i64;
    days * SECONDS_PER_DAY * NANOS_PER_SECOND + nanos
}

#[inline]
pub fn decode<T: NativeType>(chunk: &[u8]) -> T {
    let chunk: T::Bytes = match chunk.try_into() {
        Ok(chunk) => chunk,
        Err(_) => unreachable!(),
    };
    T::from_le_bytes(chunk)
}
