//! Conversion of physical values into logical [`Value`]s, driven by the
//! element's physical, converted and logical types.

use chrono::{DateTime, Duration, NaiveDate};

use crate::error::{Error, Result};
use crate::schema::types::{ConvertedType, LogicalType, PhysicalType, SchemaElement, TimeUnit};
use crate::types::int96_to_i64_ns;
use crate::value::Value;

use super::{wkb, NativeArray};

/// Hooks converting raw temporal and string payloads into [`Value`]s.
/// The defaults use [`chrono`] UTC timestamps, lossy UTF-8 strings.
pub struct Parsers {
    pub timestamp_from_milliseconds: Box<dyn Fn(i64) -> Value + Send + Sync>,
    pub timestamp_from_microseconds: Box<dyn Fn(i64) -> Value + Send + Sync>,
    pub timestamp_from_nanoseconds: Box<dyn Fn(i64) -> Value + Send + Sync>,
    pub date_from_days: Box<dyn Fn(i32) -> Value + Send + Sync>,
    pub string_from_bytes: Box<dyn Fn(&[u8]) -> Value + Send + Sync>,
}

impl Default for Parsers {
    fn default() -> Self {
        Self {
            timestamp_from_milliseconds: Box::new(|millis| {
                DateTime::from_timestamp_millis(millis)
                    .map(Value::Timestamp)
                    .unwrap_or(Value::Null)
            }),
            timestamp_from_microseconds: Box::new(|micros| {
                DateTime::from_timestamp_micros(micros)
                    .map(Value::Timestamp)
                    .unwrap_or(Value::Null)
            }),
            timestamp_from_nanoseconds: Box::new(|nanos| {
                DateTime::from_timestamp(nanos.div_euclid(1_000_000_000), nanos.rem_euclid(1_000_000_000) as u32)
                    .map(Value::Timestamp)
                    .unwrap_or(Value::Null)
            }),
            date_from_days: Box::new(|days| {
                NaiveDate::from_ymd_opt(1970, 1, 1)
                    .zip(Duration::try_days(days as i64))
                    .and_then(|(epoch, delta)| epoch.checked_add_signed(delta))
                    .map(Value::Date)
                    .unwrap_or(Value::Null)
            }),
            string_from_bytes: Box::new(|bytes| {
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            }),
        }
    }
}

impl std::fmt::Debug for Parsers {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.write_str("Parsers")
    }
}

/// Dereferences dictionary indices, then converts physical values into
/// logical ones. Dictionary pages themselves are converted with
/// `dictionary = None`.
pub fn convert_with_dictionary(
    array: NativeArray,
    dictionary: Option<&[Value]>,
    element: &SchemaElement,
    parsers: &Parsers,
    utf8: bool,
) -> Result<Vec<Value>> {
    if let NativeArray::Indices(indices) = array {
        let dictionary = dictionary
            .ok_or_else(|| Error::oos("dictionary-encoded page without a dictionary"))?;
        return indices
            .into_iter()
            .map(|index| {
                dictionary
                    .get(index as usize)
                    .cloned()
                    .ok_or_else(|| Error::oos(format!("dictionary index {index} out of range")))
            })
            .collect();
    }
    convert(array, element, parsers, utf8)
}

fn convert(
    array: NativeArray,
    element: &SchemaElement,
    parsers: &Parsers,
    utf8: bool,
) -> Result<Vec<Value>> {
    let converted = element.converted_type;
    let logical = element.logical_type;

    if converted == Some(ConvertedType::Bson) || matches!(logical, Some(LogicalType::Bson)) {
        return Err(Error::UnsupportedConverted(ConvertedType::Bson));
    }
    if converted == Some(ConvertedType::Interval) {
        return Err(Error::UnsupportedConverted(ConvertedType::Interval));
    }

    Ok(match array {
        NativeArray::Boolean(values) => values.into_iter().map(Value::Boolean).collect(),
        NativeArray::Int32(values) => {
            if let Some(scale) = decimal_scale(element) {
                let factor = 10f64.powi(-scale);
                values
                    .into_iter()
                    .map(|value| Value::Double(value as f64 * factor))
                    .collect()
            } else if converted == Some(ConvertedType::Date)
                || matches!(logical, Some(LogicalType::Date))
            {
                values
                    .into_iter()
                    .map(|value| (parsers.date_from_days)(value))
                    .collect()
            } else if is_unsigned(converted, logical) {
                values
                    .into_iter()
                    .map(|value| Value::UInt32(value as u32))
                    .collect()
            } else {
                values.into_iter().map(Value::Int32).collect()
            }
        }
        NativeArray::Int64(values) => {
            if let Some(scale) = decimal_scale(element) {
                let factor = 10f64.powi(-scale);
                values
                    .into_iter()
                    .map(|value| Value::Double(value as f64 * factor))
                    .collect()
            } else if let Some(parser) = timestamp_parser(converted, logical, parsers) {
                values.into_iter().map(parser).collect()
            } else if is_unsigned(converted, logical) {
                values
                    .into_iter()
                    .map(|value| Value::UInt64(value as u64))
                    .collect()
            } else {
                values.into_iter().map(Value::Int64).collect()
            }
        }
        NativeArray::Int96(values) => values
            .into_iter()
            .map(|value| (parsers.timestamp_from_nanoseconds)(int96_to_i64_ns(value)))
            .collect(),
        NativeArray::Float(values) => values.into_iter().map(Value::Float).collect(),
        NativeArray::Double(values) => values.into_iter().map(Value::Double).collect(),
        NativeArray::Binary(values) | NativeArray::FixedLenBinary(values) => {
            return convert_binary(values, element, parsers, utf8)
        }
        NativeArray::Indices(_) => {
            return Err(Error::oos("dictionary indices cannot be converted directly"))
        }
    })
}

fn convert_binary(
    values: Vec<Vec<u8>>,
    element: &SchemaElement,
    parsers: &Parsers,
    utf8: bool,
) -> Result<Vec<Value>> {
    let converted = element.converted_type;
    let logical = element.logical_type;

    if let Some(scale) = decimal_scale(element) {
        let factor = 10f64.powi(-scale);
        return Ok(values
            .into_iter()
            .map(|bytes| Value::Double(decimal_from_bytes(&bytes) * factor))
            .collect());
    }
    if matches!(logical, Some(LogicalType::Uuid)) {
        return values
            .into_iter()
            .map(|bytes| {
                if bytes.len() != 16 {
                    return Err(Error::oos("UUID is not 16 bytes"));
                }
                Ok(Value::String(uuid_string(&bytes)))
            })
            .collect();
    }
    if matches!(logical, Some(LogicalType::Float16)) {
        return values
            .into_iter()
            .map(|bytes| {
                let bytes: [u8; 2] =
                    bytes.as_slice().try_into().map_err(|_| Error::oos("FLOAT16 is not 2 bytes"))?;
                Ok(Value::Float(float16_to_f32(u16::from_le_bytes(bytes))))
            })
            .collect();
    }
    if converted == Some(ConvertedType::Json) || matches!(logical, Some(LogicalType::Json)) {
        return values
            .into_iter()
            .map(|bytes| {
                serde_json::from_slice::<serde_json::Value>(&bytes)
                    .map(Value::from)
                    .map_err(|e| Error::oos(format!("invalid JSON value: {e}")))
            })
            .collect();
    }
    if matches!(
        logical,
        Some(LogicalType::Geometry) | Some(LogicalType::Geography)
    ) {
        return values.into_iter().map(|bytes| wkb::decode(&bytes)).collect();
    }

    let is_string = matches!(
        converted,
        Some(ConvertedType::Utf8) | Some(ConvertedType::Enum)
    ) || matches!(
        logical,
        Some(LogicalType::String) | Some(LogicalType::Enum)
    ) || (utf8
        && element.physical_type == Some(PhysicalType::ByteArray)
        && converted.is_none()
        && logical.is_none());
    if is_string {
        return Ok(values
            .into_iter()
            .map(|bytes| (parsers.string_from_bytes)(&bytes))
            .collect());
    }

    Ok(values.into_iter().map(Value::Bytes).collect())
}

fn decimal_scale(element: &SchemaElement) -> Option<i32> {
    let annotated = element.converted_type == Some(ConvertedType::Decimal)
        || matches!(element.logical_type, Some(LogicalType::Decimal { .. }));
    if !annotated {
        return None;
    }
    if let Some(LogicalType::Decimal { scale, .. }) = element.logical_type {
        return Some(scale);
    }
    Some(element.scale.unwrap_or(0))
}

fn is_unsigned(converted: Option<ConvertedType>, logical: Option<LogicalType>) -> bool {
    matches!(
        converted,
        Some(ConvertedType::Uint8)
            | Some(ConvertedType::Uint16)
            | Some(ConvertedType::Uint32)
            | Some(ConvertedType::Uint64)
    ) || matches!(logical, Some(LogicalType::Integer { signed: false, .. }))
}

fn timestamp_parser<'a>(
    converted: Option<ConvertedType>,
    logical: Option<LogicalType>,
    parsers: &'a Parsers,
) -> Option<&'a (dyn Fn(i64) -> Value + Send + Sync)> {
    if let Some(LogicalType::Timestamp { unit, .. }) = logical {
        return Some(match unit {
            TimeUnit::Milliseconds => &*parsers.timestamp_from_milliseconds,
            TimeUnit::Microseconds => &*parsers.timestamp_from_microseconds,
            TimeUnit::Nanoseconds => &*parsers.timestamp_from_nanoseconds,
        });
    }
    match converted {
        Some(ConvertedType::TimestampMillis) => Some(&*parsers.timestamp_from_milliseconds),
        Some(ConvertedType::TimestampMicros) => Some(&*parsers.timestamp_from_microseconds),
        _ => None,
    }
}

/// A signed big-endian two's-complement integer of any width, as `f64`.
fn decimal_from_bytes(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    if bytes.len() <= 16 {
        let mut buffer = if bytes[0] & 0x80 != 0 {
            [0xFFu8; 16]
        } else {
            [0u8; 16]
        };
        buffer[16 - bytes.len()..].copy_from_slice(bytes);
        i128::from_be_bytes(buffer) as f64
    } else {
        let negative = bytes[0] & 0x80 != 0;
        let mut value = 0.0f64;
        for byte in bytes {
            value = value * 256.0 + *byte as f64;
        }
        if negative {
            value -= 2f64.powi(8 * bytes.len() as i32);
        }
        value
    }
}

/// IEEE 754 binary16: sign, 5-bit exponent (bias 15), 10-bit fraction.
fn float16_to_f32(bits: u16) -> f32 {
    let sign = bits >> 15;
    let exponent = (bits >> 10) & 0x1F;
    let fraction = bits & 0x3FF;

    let magnitude = match exponent {
        // subnormal
        0 => fraction as f32 * 2f32.powi(-24),
        31 if fraction == 0 => f32::INFINITY,
        31 => f32::NAN,
        _ => (1.0 + fraction as f32 / 1024.0) * 2f32.powi(exponent as i32 - 15),
    };
    if sign == 1 {
        -magnitude
    } else {
        magnitude
    }
}

fn uuid_string(bytes: &[u8]) -> String {
    let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
