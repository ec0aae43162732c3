//! Mapping of thrift records into schema elements.

use crate::error::{Error, Result};
use crate::thrift::Record;

use super::types::{ConvertedType, LogicalType, PhysicalType, Repetition, SchemaElement, TimeUnit};

impl SchemaElement {
    /// Builds a [`SchemaElement`] from its thrift record.
    ///
    /// Field ids follow the parquet thrift definition:
    /// 1: type, 2: type_length, 3: repetition, 4: name, 5: num_children,
    /// 6: converted_type, 7: scale, 8: precision, 10: logical_type.
    pub(crate) fn try_from_thrift(record: &Record) -> Result<Self> {
        let name = record
            .string(4)?
            .ok_or_else(|| Error::oos("schema element without a name"))?;
        let physical_type = record.i32_(1)?.map(PhysicalType::try_new).transpose()?;
        let type_length = record.i32_(2)?;
        let repetition = record.i32_(3)?.map(Repetition::try_new).transpose()?;
        let num_children = record
            .i32_(5)?
            .map(|count| {
                usize::try_from(count)
                    .map_err(|_| Error::oos(format!("negative child count in {name:?}")))
            })
            .transpose()?;
        let converted_type = record.i32_(6)?.map(ConvertedType::try_new).transpose()?;
        let scale = record.i32_(7)?;
        let precision = record.i32_(8)?;
        let logical_type = record
            .struct_(10)?
            .map(logical_type_from_thrift)
            .transpose()?;

        Ok(SchemaElement {
            name,
            physical_type,
            type_length,
            repetition,
            num_children,
            converted_type,
            scale,
            precision,
            logical_type,
        })
    }
}

/// A `LogicalType` is a thrift union: exactly one field is set and the field
/// id selects the variant.
fn logical_type_from_thrift(record: &Record) -> Result<LogicalType> {
    let id = record
        .ids()
        .next()
        .ok_or_else(|| Error::oos("empty logical type union"))?;
    Ok(match id {
        1 => LogicalType::String,
        2 => LogicalType::Map,
        3 => LogicalType::List,
        4 => LogicalType::Enum,
        5 => {
            let decimal = record.struct_(5)?.unwrap_or_else(|| unreachable!());
            LogicalType::Decimal {
                scale: decimal.i32_(1)?.unwrap_or(0),
                precision: decimal.i32_(2)?.unwrap_or(0),
            }
        }
        6 => LogicalType::Date,
        7 => {
            let time = record.struct_(7)?.unwrap_or_else(|| unreachable!());
            LogicalType::Time {
                utc: time.bool_(1)?.unwrap_or(false),
                unit: time
                    .struct_(2)?
                    .map(time_unit_from_thrift)
                    .transpose()?
                    .unwrap_or(TimeUnit::Milliseconds),
            }
        }
        8 => {
            let timestamp = record.struct_(8)?.unwrap_or_else(|| unreachable!());
            LogicalType::Timestamp {
                utc: timestamp.bool_(1)?.unwrap_or(false),
                unit: timestamp
                    .struct_(2)?
                    .map(time_unit_from_thrift)
                    .transpose()?
                    .unwrap_or(TimeUnit::Milliseconds),
            }
        }
        10 => {
            let integer = record.struct_(10)?.unwrap_or_else(|| unreachable!());
            LogicalType::Integer {
                bit_width: integer.i32_(1)?.unwrap_or(32),
                signed: integer.bool_(2)?.unwrap_or(true),
            }
        }
        11 => LogicalType::Null,
        12 => LogicalType::Json,
        13 => LogicalType::Bson,
        14 => LogicalType::Uuid,
        15 => LogicalType::Float16,
        16 => LogicalType::Variant,
        17 => LogicalType::Geometry,
        18 => LogicalType::Geography,
        other => return Err(Error::oos(format!("unknown logical type field {other}"))),
    })
}

fn time_unit_from_thrift(record: &Record) -> Result<TimeUnit> {
    let id = record
        .ids()
        .next()
        .ok_or_else(|| Error::oos("empty time unit union"))?;
    Ok(match id {
        1 => TimeUnit::Milliseconds,
        2 => TimeUnit::Microseconds,
        3 => TimeUnit::Nanoseconds,
        other => return Err(Error::oos(format!("unknown time unit field {other}"))),
    })
}
