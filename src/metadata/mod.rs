//! File, row-group and column-chunk metadata, built positionally from the
//! footer's thrift records.

use crate::compression::Compression;
use crate::error::{Error, Result};
use crate::schema::types::{PhysicalType, SchemaElement};
use crate::thrift::{Field, Record};

/// Metadata of a parquet file, decoded from the footer.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetaData {
    pub version: i32,
    /// The flat schema elements, in depth-first order.
    pub schema: Vec<SchemaElement>,
    pub num_rows: u64,
    pub row_groups: Vec<RowGroupMetaData>,
    pub created_by: Option<String>,
    /// Length in bytes of the thrift-encoded metadata.
    pub metadata_length: u32,
}

impl FileMetaData {
    /// Field ids: 1: version, 2: schema, 3: num_rows, 4: row_groups,
    /// 6: created_by.
    pub(crate) fn try_from_thrift(record: &Record, metadata_length: u32) -> Result<Self> {
        let version = record.i32_(1)?.unwrap_or(0);
        let schema = record
            .list(2)?
            .ok_or_else(|| Error::oos("file metadata without a schema"))?
            .iter()
            .map(|field| SchemaElement::try_from_thrift(expect_struct(field)?))
            .collect::<Result<Vec<_>>>()?;
        let num_rows = non_negative(record.i64_(3)?.unwrap_or(0), "num_rows")?;
        let row_groups = record
            .list(4)?
            .unwrap_or(&[])
            .iter()
            .map(|field| RowGroupMetaData::try_from_thrift(expect_struct(field)?))
            .collect::<Result<Vec<_>>>()?;
        let created_by = record.string(6)?;

        Ok(FileMetaData {
            version,
            schema,
            num_rows,
            row_groups,
            created_by,
            metadata_length,
        })
    }
}

/// Metadata of a row group: a horizontal partition of the table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroupMetaData {
    pub columns: Vec<ColumnChunkMetaData>,
    pub total_byte_size: u64,
    pub num_rows: u64,
    /// Byte offset of the first page of the first column, when written.
    pub file_offset: Option<u64>,
    pub total_compressed_size: Option<u64>,
}

impl RowGroupMetaData {
    /// Field ids: 1: columns, 2: total_byte_size, 3: num_rows,
    /// 5: file_offset, 6: total_compressed_size.
    pub(crate) fn try_from_thrift(record: &Record) -> Result<Self> {
        let columns = record
            .list(1)?
            .ok_or_else(|| Error::oos("row group without columns"))?
            .iter()
            .map(|field| ColumnChunkMetaData::try_from_thrift(expect_struct(field)?))
            .collect::<Result<Vec<_>>>()?;
        let total_byte_size = non_negative(record.i64_(2)?.unwrap_or(0), "total_byte_size")?;
        let num_rows = non_negative(record.i64_(3)?.unwrap_or(0), "num_rows")?;
        Ok(RowGroupMetaData {
            columns,
            total_byte_size,
            num_rows,
            file_offset: optional_offset(record, 5)?,
            total_compressed_size: record
                .i64_(6)?
                .map(|value| non_negative(value, "total_compressed_size"))
                .transpose()?,
        })
    }
}

/// Metadata of a column chunk: one column's contiguous region in a row group.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChunkMetaData {
    /// When set, the chunk lives in another file. Rejected by the planner.
    pub file_path: Option<String>,
    pub file_offset: u64,
    pub meta_data: Option<ColumnMetaData>,
    pub offset_index_offset: Option<u64>,
    pub offset_index_length: Option<u64>,
    pub column_index_offset: Option<u64>,
    pub column_index_length: Option<u64>,
}

impl ColumnChunkMetaData {
    /// Field ids: 1: file_path, 2: file_offset, 3: meta_data,
    /// 4/5: offset index location, 6/7: column index location.
    pub(crate) fn try_from_thrift(record: &Record) -> Result<Self> {
        Ok(ColumnChunkMetaData {
            file_path: record.string(1)?,
            file_offset: non_negative(record.i64_(2)?.unwrap_or(0), "file_offset")?,
            meta_data: record
                .struct_(3)?
                .map(ColumnMetaData::try_from_thrift)
                .transpose()?,
            offset_index_offset: optional_offset(record, 4)?,
            offset_index_length: optional_offset(record, 5)?,
            column_index_offset: optional_offset(record, 6)?,
            column_index_length: optional_offset(record, 7)?,
        })
    }

    /// The column metadata, required for decoding.
    pub fn meta_data(&self) -> Result<&ColumnMetaData> {
        self.meta_data
            .as_ref()
            .ok_or_else(|| Error::oos("column chunk without metadata"))
    }

    /// The byte range `[start, end)` of this chunk within the file, starting
    /// at the dictionary page when there is one.
    pub fn byte_range(&self) -> Result<(u64, u64)> {
        let meta = self.meta_data()?;
        let start = meta.dictionary_page_offset.unwrap_or(meta.data_page_offset);
        let end = meta.data_page_offset + meta.total_compressed_size;
        Ok((start, end))
    }
}

/// Inner metadata of a column chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetaData {
    pub physical_type: PhysicalType,
    pub path_in_schema: Vec<String>,
    pub codec: Compression,
    pub num_values: u64,
    pub total_uncompressed_size: u64,
    pub total_compressed_size: u64,
    pub data_page_offset: u64,
    pub index_page_offset: Option<u64>,
    pub dictionary_page_offset: Option<u64>,
}

impl ColumnMetaData {
    /// Field ids: 1: type, 3: path_in_schema, 4: codec, 5: num_values,
    /// 6: total_uncompressed_size, 7: total_compressed_size,
    /// 9: data_page_offset, 10: index_page_offset, 11: dictionary_page_offset.
    pub(crate) fn try_from_thrift(record: &Record) -> Result<Self> {
        let physical_type = PhysicalType::try_new(
            record
                .i32_(1)?
                .ok_or_else(|| Error::oos("column metadata without a type"))?,
        )?;
        let path_in_schema = record
            .list(3)?
            .ok_or_else(|| Error::oos("column metadata without a path"))?
            .iter()
            .map(|field| match field {
                Field::Binary(bytes) => std::str::from_utf8(bytes)
                    .map(|s| s.to_string())
                    .map_err(|_| Error::oos("path_in_schema is not valid UTF-8")),
                _ => Err(Error::thrift("path_in_schema element is not a string")),
            })
            .collect::<Result<Vec<_>>>()?;
        let codec = Compression::try_new(record.i32_(4)?.unwrap_or(0))?;

        Ok(ColumnMetaData {
            physical_type,
            path_in_schema,
            codec,
            num_values: non_negative(record.i64_(5)?.unwrap_or(0), "num_values")?,
            total_uncompressed_size: non_negative(
                record.i64_(6)?.unwrap_or(0),
                "total_uncompressed_size",
            )?,
            total_compressed_size: non_negative(
                record.i64_(7)?.unwrap_or(0),
                "total_compressed_size",
            )?,
            data_page_offset: non_negative(record.i64_(9)?.unwrap_or(0), "data_page_offset")?,
            index_page_offset: optional_offset(record, 10)?,
            dictionary_page_offset: optional_offset(record, 11)?,
        })
    }

    /// The dotted column name, e.g. `l.list.element`.
    pub fn column_name(&self) -> String {
        self.path_in_schema.join(".")
    }
}

fn expect_struct<'a, 'b>(field: &'a Field<'b>) -> Result<&'a Record<'b>> {
    match field {
        Field::Struct(record) => Ok(record),
        _ => Err(Error::thrift("list element is not a struct")),
    }
}

fn non_negative(value: i64, what: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::oos(format!("negative {what} ({value})")))
}

fn optional_offset(record: &Record, id: usize) -> Result<Option<u64>> {
    record
        .i64_(id)?
        .map(|value| non_negative(value, "offset"))
        .transpose()
}
