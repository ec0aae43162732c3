//! Page headers, decoded from the thrift preamble of every page.

use crate::encoding::Encoding;
use crate::error::{Error, Result};
use crate::thrift::Record;

/// The type of a page.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum PageType {
    DataPage,
    IndexPage,
    DictionaryPage,
    DataPageV2,
}

impl PageType {
    pub(crate) fn try_new(value: i32) -> Result<Self> {
        Ok(match value {
            0 => PageType::DataPage,
            1 => PageType::IndexPage,
            2 => PageType::DictionaryPage,
            3 => PageType::DataPageV2,
            _ => return Err(Error::oos(format!("page type {value} out of range"))),
        })
    }
}

/// Header of a v1 data page.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPageHeaderV1 {
    pub num_values: usize,
    pub encoding: Encoding,
    pub definition_level_encoding: Encoding,
    pub repetition_level_encoding: Encoding,
}

impl DataPageHeaderV1 {
    /// Field ids: 1: num_values, 2: encoding, 3: definition_level_encoding,
    /// 4: repetition_level_encoding.
    fn try_from_thrift(record: &Record) -> Result<Self> {
        Ok(DataPageHeaderV1 {
            num_values: required_count(record, 1, "num_values")?,
            encoding: required_encoding(record, 2)?,
            definition_level_encoding: required_encoding(record, 3)?,
            repetition_level_encoding: required_encoding(record, 4)?,
        })
    }
}

/// Header of a v2 data page. Levels are always RLE-encoded, stored
/// uncompressed, and their byte lengths live here in the header.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPageHeaderV2 {
    pub num_values: usize,
    pub num_nulls: usize,
    pub num_rows: usize,
    pub encoding: Encoding,
    pub definition_levels_byte_length: usize,
    pub repetition_levels_byte_length: usize,
    pub is_compressed: bool,
}

impl DataPageHeaderV2 {
    /// Field ids: 1: num_values, 2: num_nulls, 3: num_rows, 4: encoding,
    /// 5: definition_levels_byte_length, 6: repetition_levels_byte_length,
    /// 7: is_compressed.
    fn try_from_thrift(record: &Record) -> Result<Self> {
        Ok(DataPageHeaderV2 {
            num_values: required_count(record, 1, "num_values")?,
            num_nulls: required_count(record, 2, "num_nulls")?,
            num_rows: required_count(record, 3, "num_rows")?,
            encoding: required_encoding(record, 4)?,
            definition_levels_byte_length: required_count(
                record,
                5,
                "definition_levels_byte_length",
            )?,
            repetition_levels_byte_length: required_count(
                record,
                6,
                "repetition_levels_byte_length",
            )?,
            // when missing, the page is compressed
            is_compressed: record.bool_(7)?.unwrap_or(true),
        })
    }
}

/// Header of a dictionary page.
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryPageHeader {
    pub num_values: usize,
    pub encoding: Encoding,
}

impl DictionaryPageHeader {
    /// Field ids: 1: num_values, 2: encoding.
    fn try_from_thrift(record: &Record) -> Result<Self> {
        Ok(DictionaryPageHeader {
            num_values: required_count(record, 1, "num_values")?,
            encoding: required_encoding(record, 2)?,
        })
    }
}

/// The header preceding every page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageHeader {
    pub type_: PageType,
    pub uncompressed_page_size: usize,
    pub compressed_page_size: usize,
    pub data_page_header: Option<DataPageHeaderV1>,
    pub dictionary_page_header: Option<DictionaryPageHeader>,
    pub data_page_header_v2: Option<DataPageHeaderV2>,
}

impl PageHeader {
    /// Field ids: 1: type, 2: uncompressed_page_size, 3: compressed_page_size,
    /// 5: data_page_header, 7: dictionary_page_header, 8: data_page_header_v2.
    pub(crate) fn try_from_thrift(record: &Record) -> Result<Self> {
        Ok(PageHeader {
            type_: PageType::try_new(
                record
                    .i32_(1)?
                    .ok_or_else(|| Error::oos("page header without a type"))?,
            )?,
            uncompressed_page_size: required_count(record, 2, "uncompressed_page_size")?,
            compressed_page_size: required_count(record, 3, "compressed_page_size")?,
            data_page_header: record
                .struct_(5)?
                .map(DataPageHeaderV1::try_from_thrift)
                .transpose()?,
            dictionary_page_header: record
                .struct_(7)?
                .map(DictionaryPageHeader::try_from_thrift)
                .transpose()?,
            data_page_header_v2: record
                .struct_(8)?
                .map(DataPageHeaderV2::try_from_thrift)
                .transpose()?,
        })
    }
}

fn required_count(record: &Record, id: usize, what: &str) -> Result<usize> {
    let value = record
        .i32_(id)?
        .ok_or_else(|| Error::oos(format!("page header without {what}")))?;
    usize::try_from(value).map_err(|_| Error::oos(format!("negative {what} ({value})")))
}

fn required_encoding(record: &Record, id: usize) -> Result<Encoding> {
    Encoding::try_new(
        record
            .i32_(id)?
            .ok_or_else(|| Error::oos("page header without an encoding"))?,
    )
}
