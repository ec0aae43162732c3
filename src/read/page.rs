//! Decoding of a single page: decompression, level decoding and value
//! decoding.

use std::borrow::Cow;

use crate::compression::{Compression, Decompressor};
use crate::deserialize::{read_plain, NativeArray};
use crate::encoding::{
    byte_stream_split, delta_bitpacked, delta_byte_array, delta_length_byte_array, get_bit_width,
    hybrid_rle, Encoding,
};
use crate::error::{Error, Result};
use crate::page::{DataPageHeaderV2, PageHeader};
use crate::schema::types::{PhysicalType, SchemaElement};

use super::levels::{split_buffer_v1, split_buffer_v2};

/// Everything the page decoder needs to know about its column.
pub(crate) struct ColumnContext<'a> {
    pub element: &'a SchemaElement,
    pub codec: Compression,
    pub decompressor: &'a dyn Decompressor,
    pub max_rep: u32,
    pub max_def: u32,
}

impl<'a> ColumnContext<'a> {
    fn physical_type(&self) -> Result<PhysicalType> {
        self.element
            .physical_type
            .ok_or_else(|| Error::Schema(format!("column {:?} has no physical type", self.element.name)))
    }
}

/// One decoded data page: values without nulls, plus the levels to place
/// them.
#[derive(Debug)]
pub(crate) struct RawPage {
    pub values: NativeArray,
    pub def_levels: Option<Vec<u32>>,
    pub rep_levels: Vec<u32>,
}

fn decompress_buffer<'a>(
    ctx: &ColumnContext,
    input: &'a [u8],
    uncompressed_size: usize,
) -> Result<Cow<'a, [u8]>> {
    if ctx.codec == Compression::Uncompressed {
        if input.len() != uncompressed_size {
            return Err(Error::oos(
                "uncompressed page length differs from the declared size",
            ));
        }
        Ok(Cow::Borrowed(input))
    } else {
        let mut output = vec![0u8; uncompressed_size];
        ctx.decompressor.decompress(ctx.codec, input, &mut output)?;
        Ok(Cow::Owned(output))
    }
}

/// Decodes a v1 or v2 data page into values and levels.
pub(crate) fn decode_data_page(
    header: &PageHeader,
    data: &[u8],
    ctx: &ColumnContext,
) -> Result<RawPage> {
    if let Some(data_header) = &header.data_page_header {
        let buffer = decompress_buffer(ctx, data, header.uncompressed_page_size)?;
        let num_values = data_header.num_values;

        let (rep_region, def_region, values_region) =
            split_buffer_v1(&buffer, ctx.max_rep > 0, ctx.max_def > 0)?;
        let (rep_levels, def_levels) =
            decode_levels(rep_region, def_region, num_values, ctx.max_rep, ctx.max_def)?;

        let num_nulls = def_levels
            .as_ref()
            .map(|levels| levels.iter().filter(|level| **level != ctx.max_def).count())
            .unwrap_or(0);
        let values = decode_values(
            values_region,
            data_header.encoding,
            ctx,
            num_values - num_nulls,
        )?;
        Ok(RawPage {
            values,
            def_levels,
            rep_levels,
        })
    } else if let Some(data_header) = &header.data_page_header_v2 {
        decode_data_page_v2(header, data_header, data, ctx)
    } else {
        Err(Error::oos("data page without a data page header"))
    }
}

/// The v2 layout is `[rep levels | def levels | values]`, the levels always
/// uncompressed and without length prefixes.
fn decode_data_page_v2(
    header: &PageHeader,
    data_header: &DataPageHeaderV2,
    data: &[u8],
    ctx: &ColumnContext,
) -> Result<RawPage> {
    let num_values = data_header.num_values;
    let levels_length =
        data_header.repetition_levels_byte_length + data_header.definition_levels_byte_length;

    let (rep_region, def_region, values_compressed) = split_buffer_v2(
        data,
        data_header.repetition_levels_byte_length,
        data_header.definition_levels_byte_length,
    )?;
    let (rep_levels, def_levels) =
        decode_levels(rep_region, def_region, num_values, ctx.max_rep, ctx.max_def)?;

    let uncompressed_values_size = header
        .uncompressed_page_size
        .checked_sub(levels_length)
        .ok_or_else(|| Error::oos("level regions larger than the page"))?;
    let values_buffer = if data_header.is_compressed {
        decompress_buffer(ctx, values_compressed, uncompressed_values_size)?
    } else {
        Cow::Borrowed(values_compressed)
    };

    // the header already carries the null count
    let num_nulls = data_header.num_nulls;
    if num_nulls > num_values {
        return Err(Error::oos("more nulls than values in a page"));
    }
    let def_levels = def_levels.filter(|_| num_nulls > 0);
    let values = decode_values(
        &values_buffer,
        data_header.encoding,
        ctx,
        num_values - num_nulls,
    )?;
    Ok(RawPage {
        values,
        def_levels,
        rep_levels,
    })
}

fn decode_levels(
    rep_region: &[u8],
    def_region: &[u8],
    num_values: usize,
    max_rep: u32,
    max_def: u32,
) -> Result<(Vec<u32>, Option<Vec<u32>>)> {
    let rep_levels = if max_rep > 0 {
        hybrid_rle::decode(rep_region, get_bit_width(max_rep), num_values)?
    } else {
        vec![]
    };
    let def_levels = if max_def > 0 {
        let levels = hybrid_rle::decode(def_region, get_bit_width(max_def), num_values)?;
        // all-defined pages carry no information in their definition levels
        if levels.iter().all(|level| *level == max_def) {
            None
        } else {
            Some(levels)
        }
    } else {
        None
    };
    Ok((rep_levels, def_levels))
}

fn decode_values(
    values: &[u8],
    encoding: Encoding,
    ctx: &ColumnContext,
    count: usize,
) -> Result<NativeArray> {
    let physical_type = ctx.physical_type()?;
    if count == 0 {
        // an all-null page may carry no value payload at all
        return read_plain(&[], physical_type, 0, ctx.element.type_length);
    }
    match encoding {
        Encoding::Plain => read_plain(values, physical_type, count, ctx.element.type_length),
        Encoding::PlainDictionary | Encoding::RleDictionary | Encoding::Rle => {
            if physical_type == PhysicalType::Boolean {
                // booleans use an implicit bit width of 1
                let (decoded, _) = hybrid_rle::decode_length_prefixed(values, 1, count)?;
                Ok(NativeArray::Boolean(
                    decoded.into_iter().map(|value| value != 0).collect(),
                ))
            } else {
                let bit_width = *values
                    .first()
                    .ok_or_else(|| Error::oos("dictionary page data without a bit width"))?
                    as u32;
                if bit_width == 0 {
                    return Ok(NativeArray::Indices(vec![0; count]));
                }
                // indices consume the rest of the page
                Ok(NativeArray::Indices(hybrid_rle::decode(
                    &values[1..],
                    bit_width,
                    count,
                )?))
            }
        }
        Encoding::DeltaBinaryPacked => {
            let decoded = delta_bitpacked::Decoder::try_new(values)?
                .collect::<Result<Vec<i64>>>()?;
            if decoded.len() != count {
                return Err(Error::DeltaDecode(format!(
                    "page declares {count} values, payload holds {}",
                    decoded.len()
                )));
            }
            match physical_type {
                PhysicalType::Int32 => Ok(NativeArray::Int32(
                    decoded.into_iter().map(|value| value as i32).collect(),
                )),
                PhysicalType::Int64 => Ok(NativeArray::Int64(decoded)),
                other => Err(Error::UnsupportedType(format!(
                    "DELTA_BINARY_PACKED on {other:?}"
                ))),
            }
        }
        Encoding::DeltaLengthByteArray => {
            let decoded = delta_length_byte_array::decode(values)?;
            if decoded.len() != count {
                return Err(Error::DeltaDecode(format!(
                    "page declares {count} values, payload holds {}",
                    decoded.len()
                )));
            }
            Ok(NativeArray::Binary(decoded))
        }
        Encoding::DeltaByteArray => {
            let decoded = delta_byte_array::decode(values)?;
            if decoded.len() != count {
                return Err(Error::DeltaDecode(format!(
                    "page declares {count} values, payload holds {}",
                    decoded.len()
                )));
            }
            Ok(NativeArray::Binary(decoded))
        }
        Encoding::ByteStreamSplit => match physical_type {
            PhysicalType::Float => Ok(NativeArray::Float(
                byte_stream_split::Decoder::<f32>::try_new(values)?.collect(),
            )),
            PhysicalType::Double => Ok(NativeArray::Double(
                byte_stream_split::Decoder::<f64>::try_new(values)?.collect(),
            )),
            PhysicalType::Int32 => Ok(NativeArray::Int32(
                byte_stream_split::Decoder::<i32>::try_new(values)?.collect(),
            )),
            PhysicalType::Int64 => Ok(NativeArray::Int64(
                byte_stream_split::Decoder::<i64>::try_new(values)?.collect(),
            )),
            PhysicalType::FixedLenByteArray => {
                let size = ctx
                    .element
                    .type_length
                    .filter(|length| *length > 0)
                    .ok_or_else(|| {
                        Error::Schema("fixed length column without a length".to_string())
                    })?;
                Ok(NativeArray::FixedLenBinary(byte_stream_split::decode_fixed(
                    values,
                    size as usize,
                )?))
            }
            other => Err(Error::UnsupportedType(format!(
                "BYTE_STREAM_SPLIT on {other:?}"
            ))),
        },
        Encoding::BitPacked => Err(Error::UnsupportedEncoding(Encoding::BitPacked)),
    }
}

/// Decodes a dictionary page into its PLAIN-encoded values.
pub(crate) fn decode_dictionary_page(
    header: &PageHeader,
    data: &[u8],
    ctx: &ColumnContext,
) -> Result<NativeArray> {
    let dictionary_header = header
        .dictionary_page_header
        .as_ref()
        .ok_or_else(|| Error::oos("dictionary page without a dictionary header"))?;
    let buffer = decompress_buffer(ctx, data, header.uncompressed_page_size)?;
    read_plain(
        &buffer,
        ctx.physical_type()?,
        dictionary_header.num_values,
        ctx.element.type_length,
    )
}
