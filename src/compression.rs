//! Decompression of parquet pages.
//!
//! [`decompress`] implements the decompressor contract with the codecs
//! compiled into this crate; callers may replace it wholesale through the
//! [`Decompressor`] trait.

use crate::error::{Error, Result};

/// The compression codec of a column chunk.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy)]
pub enum Compression {
    Uncompressed,
    Snappy,
    Gzip,
    Lzo,
    Brotli,
    Lz4,
    Zstd,
    Lz4Raw,
}

impl Compression {
    pub(crate) fn try_new(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Compression::Uncompressed,
            1 => Compression::Snappy,
            2 => Compression::Gzip,
            3 => Compression::Lzo,
            4 => Compression::Brotli,
            5 => Compression::Lz4,
            6 => Compression::Zstd,
            7 => Compression::Lz4Raw,
            _ => return Err(Error::oos(format!("compression codec {value} out of range"))),
        })
    }
}

/// Decompresses `input` into `output`, which is sized to exactly the
/// uncompressed length declared in the page header. Fails when the payload
/// does not fill `output` exactly.
pub fn decompress(compression: Compression, input: &[u8], output: &mut [u8]) -> Result<()> {
    match compression {
        Compression::Uncompressed => {
            if input.len() != output.len() {
                return Err(Error::oos(
                    "uncompressed page length differs from the declared size",
                ));
            }
            output.copy_from_slice(input);
            Ok(())
        }
        #[cfg(feature = "snappy")]
        Compression::Snappy => {
            let length = snap::raw::decompress_len(input)?;
            if length != output.len() {
                return Err(Error::oos(format!(
                    "snappy payload decompresses to {length} bytes, header declares {}",
                    output.len()
                )));
            }
            snap::raw::Decoder::new().decompress(input, output)?;
            Ok(())
        }
        #[cfg(not(feature = "snappy"))]
        Compression::Snappy => Err(Error::FeatureNotActive(
            crate::error::Feature::Snappy,
            "decompressing snappy".to_string(),
        )),
        #[cfg(feature = "gzip")]
        Compression::Gzip => {
            use std::io::Read;
            let mut decoder = flate2::read::MultiGzDecoder::new(input);
            decoder.read_exact(output)?;
            Ok(())
        }
        #[cfg(not(feature = "gzip"))]
        Compression::Gzip => Err(Error::FeatureNotActive(
            crate::error::Feature::Gzip,
            "decompressing gzip".to_string(),
        )),
        #[cfg(feature = "brotli")]
        Compression::Brotli => {
            use std::io::Read;
            const BROTLI_DEFAULT_BUFFER_SIZE: usize = 4096;
            brotli::Decompressor::new(input, BROTLI_DEFAULT_BUFFER_SIZE).read_exact(output)?;
            Ok(())
        }
        #[cfg(not(feature = "brotli"))]
        Compression::Brotli => Err(Error::FeatureNotActive(
            crate::error::Feature::Brotli,
            "decompressing brotli".to_string(),
        )),
        #[cfg(feature = "lz4")]
        Compression::Lz4Raw => {
            let written = lz4_flex::block::decompress_into(input, output)?;
            if written != output.len() {
                return Err(Error::oos(format!(
                    "lz4 payload decompresses to {written} bytes, header declares {}",
                    output.len()
                )));
            }
            Ok(())
        }
        #[cfg(not(feature = "lz4"))]
        Compression::Lz4Raw => Err(Error::FeatureNotActive(
            crate::error::Feature::Lz4,
            "decompressing lz4".to_string(),
        )),
        #[cfg(feature = "lz4")]
        Compression::Lz4 => try_decompress_hadoop_lz4(input, output),
        #[cfg(not(feature = "lz4"))]
        Compression::Lz4 => Err(Error::FeatureNotActive(
            crate::error::Feature::Lz4,
            "decompressing lz4".to_string(),
        )),
        #[cfg(feature = "zstd")]
        Compression::Zstd => {
            let written = zstd::bulk::decompress_to_buffer(input, output)?;
            if written != output.len() {
                return Err(Error::oos(format!(
                    "zstd payload decompresses to {written} bytes, header declares {}",
                    output.len()
                )));
            }
            Ok(())
        }
        #[cfg(not(feature = "zstd"))]
        Compression::Zstd => Err(Error::FeatureNotActive(
            crate::error::Feature::Zstd,
            "decompressing zstd".to_string(),
        )),
        Compression::Lzo => Err(Error::UnsupportedCodec(Compression::Lzo)),
    }
}

/// Legacy parquet LZ4 is the hadoop framing: repeated
/// `[u32 BE uncompressed length | u32 BE compressed length | block]` frames.
/// Some writers emitted raw LZ4 blocks under the same codec id, so a frame
/// mismatch falls back to a whole-buffer raw decompression.
#[cfg(feature = "lz4")]
fn try_decompress_hadoop_lz4(input: &[u8], output: &mut [u8]) -> Result<()> {
    const PREFIX_LEN: usize = 8;

    let mut input_offset = 0;
    let mut output_offset = 0;
    while input.len() - input_offset >= PREFIX_LEN {
        let expected = u32::from_be_bytes(input[input_offset..input_offset + 4].try_into().unwrap())
            as usize;
        let compressed =
            u32::from_be_bytes(input[input_offset + 4..input_offset + 8].try_into().unwrap())
                as usize;
        input_offset += PREFIX_LEN;

        let frame_fits = input_offset + compressed <= input.len()
            && output_offset + expected <= output.len();
        if !frame_fits {
            return fallback_raw_lz4(input, output);
        }
        let written = match lz4_flex::block::decompress_into(
            &input[input_offset..input_offset + compressed],
            &mut output[output_offset..output_offset + expected],
        ) {
            Ok(written) => written,
            Err(_) => return fallback_raw_lz4(input, output),
        };
        if written != expected {
            return fallback_raw_lz4(input, output);
        }
        input_offset += compressed;
        output_offset += expected;
    }
    if input_offset != input.len() || output_offset != output.len() {
        return fallback_raw_lz4(input, output);
    }
    Ok(())
}

#[cfg(feature = "lz4")]
fn fallback_raw_lz4(input: &[u8], output: &mut [u8]) -> Result<()> {
    let written = lz4_flex::block::decompress_into(input, output)?;
    if written != output.len() {
        return Err(Error::oos(format!(
            "lz4 payload decompresses to {written} bytes, header declares {}",
            output.len()
        )));
    }
    Ok(())
}

/// Pluggable decompression. Implementations must be pure functions of their
/// input: the same bytes always produce the same output.
pub trait Decompressor: Send + Sync {
    fn decompress(&self, compression: Compression, input: &[u8], output: &mut [u8]) -> Result<()>;
}

/// The codecs compiled into this crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDecompressor;

impl Decompressor for DefaultDecompressor {
    fn decompress(&self, compression: Compression, input: &[u8], output: &mut [u8]) -> Result<()> {
        decompress(compression, input, output)
    }
}
