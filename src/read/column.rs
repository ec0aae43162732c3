//! Reading of one column chunk: page iteration, dictionary handling, chunk
//! accumulation and row selection.

use crate::compression::{Compression, Decompressor};
use crate::deserialize::{assemble_lists, convert_with_dictionary, Parsers};
use crate::error::{Error, Result};
use crate::page::{PageHeader, PageType};
use crate::schema::types::{Repetition, SchemaElement};
use crate::thrift::CompactReader;
use crate::value::Value;

use super::page::{decode_data_page, decode_dictionary_page, ColumnContext};

/// Everything needed to decode one column chunk.
pub(crate) struct ColumnDecoder<'a> {
    /// Dotted column name, e.g. `l.list.element`.
    pub name: String,
    pub element: &'a SchemaElement,
    /// Repetition of every element on the path, root first (as `Required`).
    pub rep_path: Vec<Repetition>,
    pub max_rep: u32,
    pub max_def: u32,
    /// A root-level, childless, non-repeated column.
    pub flat: bool,
    pub codec: Compression,
    /// Total number of leaf values in the chunk.
    pub num_values: u64,
    pub parsers: &'a Parsers,
    pub decompressor: &'a dyn Decompressor,
    pub utf8: bool,
}

/// One decoded stretch of a column: the rows of one page, or of several pages
/// when rows span page boundaries.
#[derive(Debug)]
pub(crate) struct Chunk {
    /// First row of this chunk, relative to the row group.
    pub row_start: u64,
    pub values: Vec<Value>,
    /// A null-filled stand-in for a page wholly before the selection.
    pub placeholder: bool,
}

impl Chunk {
    pub(crate) fn row_end(&self) -> u64 {
        self.row_start + self.values.len() as u64
    }
}

/// Decodes the pages of one column chunk into row-aligned chunks covering
/// rows `[0, select_end)` of the group.
pub(crate) fn read_column_chunk(
    decoder: &ColumnDecoder,
    data: &[u8],
    select_start: u64,
    select_end: u64,
) -> Result<Vec<Chunk>> {
    let ctx = ColumnContext {
        element: decoder.element,
        codec: decoder.codec,
        decompressor: decoder.decompressor,
        max_rep: decoder.max_rep,
        max_def: decoder.max_def,
    };

    let mut chunks: Vec<Chunk> = vec![];
    let mut dictionary: Option<Vec<Value>> = None;
    let mut rows = 0u64;
    let mut seen_values = 0u64;
    let mut offset = 0usize;

    while offset < data.len() && seen_values < decoder.num_values {
        if decoder.flat && rows >= select_end {
            break;
        }

        let mut reader = CompactReader::new(&data[offset..]);
        let record = reader.read_struct()?;
        let header = PageHeader::try_from_thrift(&record)?;
        let page_start = offset + reader.offset();
        let page_end = page_start
            .checked_add(header.compressed_page_size)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| Error::oos("page overruns the column chunk"))?;
        let page_data = &data[page_start..page_end];
        offset = page_end;

        match header.type_ {
            PageType::IndexPage => {}
            PageType::DictionaryPage => {
                if dictionary.is_some() {
                    return Err(Error::oos("second dictionary page in a column chunk"));
                }
                let array = decode_dictionary_page(&header, page_data, &ctx)?;
                // converted once; data pages then only gather by index
                dictionary = Some(convert_with_dictionary(
                    array,
                    None,
                    decoder.element,
                    decoder.parsers,
                    decoder.utf8,
                )?);
            }
            PageType::DataPage | PageType::DataPageV2 => {
                let (page_values, page_rows) = match (&header.data_page_header, &header.data_page_header_v2) {
                    (Some(v1), _) => (v1.num_values, v1.num_values),
                    (_, Some(v2)) => (v2.num_values, v2.num_rows),
                    _ => return Err(Error::oos("data page without a data page header")),
                };
                seen_values += page_values as u64;

                // a flat page wholly before the selection is never decoded
                if decoder.flat && rows + page_rows as u64 <= select_start {
                    chunks.push(Chunk {
                        row_start: rows,
                        values: vec![Value::Null; page_values],
                        placeholder: true,
                    });
                    rows += page_rows as u64;
                    continue;
                }

                let raw = decode_data_page(&header, page_data, &ctx)?;
                let values = convert_with_dictionary(
                    raw.values,
                    dictionary.as_deref(),
                    decoder.element,
                    decoder.parsers,
                    decoder.utf8,
                )?;

                if raw.rep_levels.is_empty() && raw.def_levels.is_none() {
                    // every value is a row of its own
                    let row_start = rows;
                    rows += values.len() as u64;
                    chunks.push(Chunk {
                        row_start,
                        values,
                        placeholder: false,
                    });
                } else {
                    let continues_row = raw.rep_levels.first().copied().unwrap_or(0) > 0;
                    match chunks.last_mut() {
                        // a page whose first value continues the last open row
                        Some(previous) if continues_row && !previous.placeholder => {
                            let before = previous.values.len();
                            assemble_lists(
                                &mut previous.values,
                                raw.def_levels.as_deref(),
                                &raw.rep_levels,
                                values,
                                &decoder.rep_path,
                            );
                            rows += (previous.values.len() - before) as u64;
                        }
                        _ => {
                            let mut assembled = vec![];
                            assemble_lists(
                                &mut assembled,
                                raw.def_levels.as_deref(),
                                &raw.rep_levels,
                                values,
                                &decoder.rep_path,
                            );
                            let row_start = rows;
                            rows += assembled.len() as u64;
                            chunks.push(Chunk {
                                row_start,
                                values: assembled,
                                placeholder: false,
                            });
                        }
                    }
                }
            }
        }
    }

    // truncate to the selection's end
    chunks.retain(|chunk| chunk.row_start < select_end);
    if let Some(last) = chunks.last_mut() {
        if last.row_end() > select_end {
            last.values.truncate((select_end - last.row_start) as usize);
        }
    }
    Ok(chunks)
}
