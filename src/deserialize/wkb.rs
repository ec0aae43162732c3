//! Decoding of Well-Known Binary geometries into GeoJSON-shaped records,
//! for columns with a GEOMETRY/GEOGRAPHY logical type.

use crate::error::{Error, Result};
use crate::value::Value;

struct Cursor<'a> {
    values: &'a [u8],
    offset: usize,
    little_endian: bool,
}

impl<'a> Cursor<'a> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self
            .values
            .get(self.offset..self.offset + N)
            .ok_or_else(|| Error::oos("WKB buffer too short"))?;
        self.offset += N;
        Ok(bytes.try_into().unwrap())
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take::<4>()?;
        Ok(if self.little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    }

    fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.take::<8>()?;
        Ok(if self.little_endian {
            f64::from_le_bytes(bytes)
        } else {
            f64::from_be_bytes(bytes)
        })
    }

    fn read_point(&mut self) -> Result<Value> {
        let x = self.read_f64()?;
        let y = self.read_f64()?;
        Ok(Value::List(vec![Value::Double(x), Value::Double(y)]))
    }

    fn read_points(&mut self) -> Result<Value> {
        let count = self.read_u32()? as usize;
        Ok(Value::List(
            (0..count)
                .map(|_| self.read_point())
                .collect::<Result<Vec<_>>>()?,
        ))
    }

    fn read_rings(&mut self) -> Result<Value> {
        let count = self.read_u32()? as usize;
        Ok(Value::List(
            (0..count)
                .map(|_| self.read_points())
                .collect::<Result<Vec<_>>>()?,
        ))
    }
}

/// Decodes one WKB geometry into `{type, coordinates}`.
pub(crate) fn decode(values: &[u8]) -> Result<Value> {
    let mut cursor = Cursor {
        values,
        offset: 1,
        little_endian: match values.first() {
            Some(0) => false,
            Some(1) => true,
            _ => return Err(Error::oos("WKB without a byte-order mark")),
        },
    };
    let geometry_type = cursor.read_u32()?;

    let (name, coordinates) = match geometry_type {
        1 => ("Point", cursor.read_point()?),
        2 => ("LineString", cursor.read_points()?),
        3 => ("Polygon", cursor.read_rings()?),
        4 => {
            // each point carries its own header
            let count = cursor.read_u32()? as usize;
            let points = (0..count)
                .map(|_| {
                    let remainder = &values[cursor.offset..];
                    let point = decode(remainder)?;
                    cursor.offset += 1 + 4 + 16;
                    match point {
                        Value::Record(fields) => Ok(fields
                            .into_iter()
                            .find(|(name, _)| name == "coordinates")
                            .map(|(_, coordinates)| coordinates)
                            .unwrap_or(Value::Null)),
                        _ => Err(Error::oos("malformed nested WKB point")),
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            ("MultiPoint", Value::List(points))
        }
        other => {
            return Err(Error::oos(format!("unsupported WKB geometry type {other}")));
        }
    };

    Ok(Value::Record(vec![
        ("type".to_string(), Value::String(name.to_string())),
        ("coordinates".to_string(), coordinates),
    ]))
}
