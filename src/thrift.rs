//! Reader of the Thrift Compact Protocol, the serialization of all parquet
//! metadata (footer, page headers).
//!
//! Structs are decoded into positional [`Record`]s indexed by field id, so
//! that unknown fields written by newer producers are carried along instead of
//! breaking the decoder.

use crate::error::{Error, Result};

/// Upper bound on field ids this reader accepts. Parquet's own structs stay
/// below 20; anything larger signals a corrupt or adversarial buffer.
const MAX_FIELD_ID: i16 = 1024;

/// The element types of the compact protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompactType {
    BooleanTrue,
    BooleanFalse,
    Byte,
    I16,
    I32,
    I64,
    Double,
    Binary,
    List,
    Struct,
}

impl CompactType {
    fn try_new(nibble: u8) -> Result<Self> {
        Ok(match nibble {
            1 => CompactType::BooleanTrue,
            2 => CompactType::BooleanFalse,
            3 => CompactType::Byte,
            4 => CompactType::I16,
            5 => CompactType::I32,
            6 => CompactType::I64,
            7 => CompactType::Double,
            8 => CompactType::Binary,
            9 => CompactType::List,
            12 => CompactType::Struct,
            // SET, MAP and UUID never occur in parquet metadata
            other => return Err(Error::thrift(format!("unknown compact type {other}"))),
        })
    }
}

/// A single decoded thrift value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<'a> {
    Bool(bool),
    I32(i32),
    I64(i64),
    Double(f64),
    Binary(&'a [u8]),
    List(Vec<Field<'a>>),
    Struct(Record<'a>),
}

/// A decoded thrift struct: fields stored positionally by field id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record<'a> {
    fields: Vec<Option<Field<'a>>>,
}

impl<'a> Record<'a> {
    /// Returns the field with id `id`, if present.
    #[inline]
    pub fn get(&self, id: usize) -> Option<&Field<'a>> {
        self.fields.get(id).and_then(|field| field.as_ref())
    }

    fn set(&mut self, id: i16, field: Field<'a>) -> Result<()> {
        if !(1..=MAX_FIELD_ID).contains(&id) {
            return Err(Error::thrift(format!("field id {id} out of range")));
        }
        let id = id as usize;
        if self.fields.len() <= id {
            self.fields.resize(id + 1, None);
        }
        self.fields[id] = Some(field);
        Ok(())
    }

    pub fn bool_(&self, id: usize) -> Result<Option<bool>> {
        match self.get(id) {
            None => Ok(None),
            Some(Field::Bool(value)) => Ok(Some(*value)),
            Some(_) => Err(type_mismatch(id, "bool")),
        }
    }

    pub fn i32_(&self, id: usize) -> Result<Option<i32>> {
        match self.get(id) {
            None => Ok(None),
            Some(Field::I32(value)) => Ok(Some(*value)),
            Some(_) => Err(type_mismatch(id, "i32")),
        }
    }

    pub fn i64_(&self, id: usize) -> Result<Option<i64>> {
        match self.get(id) {
            None => Ok(None),
            Some(Field::I64(value)) => Ok(Some(*value)),
            // writers are free to downsize integers
            Some(Field::I32(value)) => Ok(Some(*value as i64)),
            Some(_) => Err(type_mismatch(id, "i64")),
        }
    }

    pub fn binary(&self, id: usize) -> Result<Option<&'a [u8]>> {
        match self.get(id) {
            None => Ok(None),
            Some(Field::Binary(value)) => Ok(Some(value)),
            Some(_) => Err(type_mismatch(id, "binary")),
        }
    }

    pub fn string(&self, id: usize) -> Result<Option<String>> {
        self.binary(id)?
            .map(|bytes| {
                std::str::from_utf8(bytes)
                    .map(|s| s.to_string())
                    .map_err(|_| Error::thrift(format!("field {id} is not valid UTF-8")))
            })
            .transpose()
    }

    pub fn list(&self, id: usize) -> Result<Option<&[Field<'a>]>> {
        match self.get(id) {
            None => Ok(None),
            Some(Field::List(values)) => Ok(Some(values)),
            Some(_) => Err(type_mismatch(id, "list")),
        }
    }

    pub fn struct_(&self, id: usize) -> Result<Option<&Record<'a>>> {
        match self.get(id) {
            None => Ok(None),
            Some(Field::Struct(record)) => Ok(Some(record)),
            Some(_) => Err(type_mismatch(id, "struct")),
        }
    }

    /// The ids of the fields present in this record, in increasing order.
    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter_map(|(id, field)| field.as_ref().map(|_| id))
    }
}

fn type_mismatch(id: usize, expected: &str) -> Error {
    Error::thrift(format!("field {id} is not a {expected}"))
}

/// A cursor decoding compact-protocol values from a byte slice.
#[derive(Debug)]
pub struct CompactReader<'a> {
    values: &'a [u8],
    offset: usize,
}

impl<'a> CompactReader<'a> {
    pub fn new(values: &'a [u8]) -> Self {
        Self { values, offset: 0 }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    fn next_byte(&mut self) -> Result<u8> {
        let byte = *self
            .values
            .get(self.offset)
            .ok_or_else(|| Error::thrift("unexpected end of buffer"))?;
        self.offset += 1;
        Ok(byte)
    }

    #[inline]
    fn take(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(length)
            .filter(|end| *end <= self.values.len())
            .ok_or_else(|| Error::thrift("unexpected end of buffer"))?;
        let slice = &self.values[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// ULEB128: 7 bits per byte, least significant group first.
    pub fn read_varint(&mut self) -> Result<u32> {
        let mut result: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.next_byte()?;
            result |= ((byte & 0x7F) as u32) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(Error::thrift("varint longer than 5 bytes"))
    }

    pub fn read_varlong(&mut self) -> Result<u64> {
        let mut result: u64 = 0;
        for shift in (0..70).step_by(7) {
            let byte = self.next_byte()?;
            result |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(Error::thrift("varint longer than 10 bytes"))
    }

    pub fn read_zigzag_i32(&mut self) -> Result<i32> {
        let value = self.read_varint()?;
        Ok((value >> 1) as i32 ^ -((value & 1) as i32))
    }

    pub fn read_zigzag_i64(&mut self) -> Result<i64> {
        let value = self.read_varlong()?;
        Ok((value >> 1) as i64 ^ -((value & 1) as i64))
    }

    /// Decodes a struct: a sequence of field headers terminated by STOP.
    pub fn read_struct(&mut self) -> Result<Record<'a>> {
        let mut record = Record::default();
        let mut last_id: i16 = 0;
        loop {
            let header = self.next_byte()?;
            if header == 0 {
                // STOP
                return Ok(record);
            }
            let type_ = CompactType::try_new(header & 0x0F)?;
            let delta = (header >> 4) & 0x0F;
            let id = if delta == 0 {
                let id = self.read_zigzag_i32()?;
                i16::try_from(id).map_err(|_| Error::thrift("field id overflows i16"))?
            } else {
                last_id
                    .checked_add(delta as i16)
                    .ok_or_else(|| Error::thrift("field id overflows i16"))?
            };
            last_id = id;
            let field = self.read_element(type_)?;
            record.set(id, field)?;
        }
    }

    fn read_element(&mut self, type_: CompactType) -> Result<Field<'a>> {
        Ok(match type_ {
            CompactType::BooleanTrue => Field::Bool(true),
            CompactType::BooleanFalse => Field::Bool(false),
            CompactType::Byte => Field::I32(self.next_byte()? as i8 as i32),
            CompactType::I16 | CompactType::I32 => Field::I32(self.read_zigzag_i32()?),
            CompactType::I64 => Field::I64(self.read_zigzag_i64()?),
            CompactType::Double => {
                let bytes: [u8; 8] = self.take(8)?.try_into().unwrap();
                Field::Double(f64::from_le_bytes(bytes))
            }
            CompactType::Binary => {
                let length = self.read_varint()? as usize;
                Field::Binary(self.take(length)?)
            }
            CompactType::List => Field::List(self.read_list()?),
            CompactType::Struct => Field::Struct(self.read_struct()?),
        })
    }

    fn read_list(&mut self) -> Result<Vec<Field<'a>>> {
        let header = self.next_byte()?;
        let element_type = header & 0x0F;
        let size = (header >> 4) & 0x0F;
        let size = if size == 15 {
            self.read_varint()? as usize
        } else {
            size as usize
        };

        // bool elements are one byte each, the byte being the element type
        if element_type == 1 || element_type == 2 {
            return (0..size)
                .map(|_| Ok(Field::Bool(self.next_byte()? == 1)))
                .collect();
        }
        let element_type = CompactType::try_new(element_type)?;
        (0..size).map(|_| self.read_element(element_type)).collect()
    }
}
