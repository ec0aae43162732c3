use crate::error::{Error, Result};

/// The repetition of a parquet field.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum Repetition {
    /// When the field has no null values
    Required,
    /// When the field may have null values
    Optional,
    /// When the field may be repeated (list field)
    Repeated,
}

impl Repetition {
    pub(crate) fn try_new(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Repetition::Required,
            1 => Repetition::Optional,
            2 => Repetition::Repeated,
            _ => return Err(Error::oos(format!("repetition {value} out of range"))),
        })
    }
}

/// The physical type of a leaf column, as stored on disk.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    /// The length lives in [`SchemaElement::type_length`].
    FixedLenByteArray,
}

impl PhysicalType {
    pub(crate) fn try_new(value: i32) -> Result<Self> {
        Ok(match value {
            0 => PhysicalType::Boolean,
            1 => PhysicalType::Int32,
            2 => PhysicalType::Int64,
            3 => PhysicalType::Int96,
            4 => PhysicalType::Float,
            5 => PhysicalType::Double,
            6 => PhysicalType::ByteArray,
            7 => PhysicalType::FixedLenByteArray,
            _ => return Err(Error::oos(format!("physical type {value} out of range"))),
        })
    }
}

/// The deprecated converted type of an element.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum ConvertedType {
    Utf8,
    Map,
    MapKeyValue,
    List,
    Enum,
    Decimal,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Json,
    Bson,
    Interval,
}

impl ConvertedType {
    pub(crate) fn try_new(value: i32) -> Result<Self> {
        Ok(match value {
            0 => ConvertedType::Utf8,
            1 => ConvertedType::Map,
            2 => ConvertedType::MapKeyValue,
            3 => ConvertedType::List,
            4 => ConvertedType::Enum,
            5 => ConvertedType::Decimal,
            6 => ConvertedType::Date,
            7 => ConvertedType::TimeMillis,
            8 => ConvertedType::TimeMicros,
            9 => ConvertedType::TimestampMillis,
            10 => ConvertedType::TimestampMicros,
            11 => ConvertedType::Uint8,
            12 => ConvertedType::Uint16,
            13 => ConvertedType::Uint32,
            14 => ConvertedType::Uint64,
            15 => ConvertedType::Int8,
            16 => ConvertedType::Int16,
            17 => ConvertedType::Int32,
            18 => ConvertedType::Int64,
            19 => ConvertedType::Json,
            20 => ConvertedType::Bson,
            21 => ConvertedType::Interval,
            _ => return Err(Error::oos(format!("converted type {value} out of range"))),
        })
    }
}

/// The resolution of a logical TIME/TIMESTAMP.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum TimeUnit {
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

/// The logical type of an element, the successor of [`ConvertedType`].
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LogicalType {
    String,
    Map,
    List,
    Enum,
    Decimal { scale: i32, precision: i32 },
    Date,
    Time { utc: bool, unit: TimeUnit },
    Timestamp { utc: bool, unit: TimeUnit },
    Integer { bit_width: i32, signed: bool },
    Null,
    Json,
    Bson,
    Uuid,
    Float16,
    Variant,
    Geometry,
    Geography,
}

/// A flat schema element, in the depth-first order of the footer.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaElement {
    pub name: String,
    /// `None` for group elements.
    pub physical_type: Option<PhysicalType>,
    /// Byte length of FIXED_LEN_BYTE_ARRAY leaves.
    pub type_length: Option<i32>,
    /// `None` only for the root.
    pub repetition: Option<Repetition>,
    /// `None` for leaves.
    pub num_children: Option<usize>,
    pub converted_type: Option<ConvertedType>,
    pub scale: Option<i32>,
    pub precision: Option<i32>,
    pub logical_type: Option<LogicalType>,
}

impl SchemaElement {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.num_children.is_none()
    }
}
