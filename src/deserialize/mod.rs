//! From decoded page payloads to materialised [`Value`](crate::value::Value)s:
//! typed arrays, logical-type conversion and record assembly.

mod assemble;
mod convert;
mod wkb;

pub use assemble::{assemble_lists, assemble_nested};
pub use convert::{convert_with_dictionary, Parsers};

use crate::encoding::plain;
use crate::error::{Error, Result};
use crate::schema::types::PhysicalType;

/// A decoded array of one page's values, in the narrowest physical container
/// that fits. Dictionary indices are their own variant: dereference is a
/// static distinction, not a runtime inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeArray {
    Boolean(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int96(Vec<[u32; 3]>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Binary(Vec<Vec<u8>>),
    FixedLenBinary(Vec<Vec<u8>>),
    /// Indices into a dictionary page's array.
    Indices(Vec<u32>),
}

impl NativeArray {
    pub fn len(&self) -> usize {
        match self {
            NativeArray::Boolean(values) => values.len(),
            NativeArray::Int32(values) => values.len(),
            NativeArray::Int64(values) => values.len(),
            NativeArray::Int96(values) => values.len(),
            NativeArray::Float(values) => values.len(),
            NativeArray::Double(values) => values.len(),
            NativeArray::Binary(values) => values.len(),
            NativeArray::FixedLenBinary(values) => values.len(),
            NativeArray::Indices(values) => values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads `count` PLAIN-encoded values of `physical_type`.
pub(crate) fn read_plain(
    values: &[u8],
    physical_type: PhysicalType,
    count: usize,
    type_length: Option<i32>,
) -> Result<NativeArray> {
    Ok(match physical_type {
        PhysicalType::Boolean => NativeArray::Boolean(plain::read_bools(values, count)?),
        PhysicalType::Int32 => NativeArray::Int32(plain::read_native(values, count)?),
        PhysicalType::Int64 => NativeArray::Int64(plain::read_native(values, count)?),
        PhysicalType::Int96 => NativeArray::Int96(plain::read_native(values, count)?),
        PhysicalType::Float => NativeArray::Float(plain::read_native(values, count)?),
        PhysicalType::Double => NativeArray::Double(plain::read_native(values, count)?),
        PhysicalType::ByteArray => NativeArray::Binary(plain::read_byte_arrays(values, count)?),
        PhysicalType::FixedLenByteArray => {
            let size = type_length
                .filter(|length| *length > 0)
                .ok_or_else(|| Error::Schema("fixed length column without a length".to_string()))?;
            NativeArray::FixedLenBinary(plain::read_fixed(values, size as usize, count)?)
        }
    })
}
