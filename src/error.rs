//! Error handling for reading parquet files.

use crate::compression::Compression;
use crate::encoding::Encoding;
use crate::schema::types::ConvertedType;

/// A feature of this crate that must be enabled at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Snappy,
    Gzip,
    Brotli,
    Lz4,
    Zstd,
}

/// Errors generated by this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The file is too short to contain a parquet footer.
    ShortFile,
    /// The footer does not end in the magic `PAR1`.
    BadMagic,
    /// The metadata length declared in the footer does not fit in the file.
    BadMetadataLength(u32),
    /// Malformed thrift compact protocol data.
    Thrift(String),
    /// The encoding is known but this crate does not decode it.
    UnsupportedEncoding(Encoding),
    /// The compression codec is known but this crate does not decompress it.
    UnsupportedCodec(Compression),
    /// The physical type cannot be decoded in this position.
    UnsupportedType(String),
    /// The converted type is a declared non-goal of this crate.
    UnsupportedConverted(ConvertedType),
    /// A bit-packed run would read past the end of its buffer.
    BitpackOutOfBounds,
    /// A DELTA_BINARY_PACKED payload violates its own header.
    DeltaDecode(String),
    /// The schema is inconsistent (missing element, length mismatch, malformed
    /// list or map group).
    Schema(String),
    /// A column chunk references data outside the current file.
    ExternalFile(String),
    /// A single compressed column chunk exceeds the allocation guard.
    ColumnTooLarge(String, u64),
    /// The plan and the prefetch buffer disagree on a byte range.
    PrefetchMiss(u64, u64),
    /// The underlying byte source failed.
    Source(String),
    /// The requested codec was compiled out.
    FeatureNotActive(Feature, String),
    /// The parquet file is otherwise out of spec.
    OutOfSpec(String),
}

impl Error {
    pub(crate) fn oos<I: Into<String>>(message: I) -> Self {
        Error::OutOfSpec(message.into())
    }

    pub(crate) fn thrift<I: Into<String>>(message: I) -> Self {
        Error::Thrift(message.into())
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::ShortFile => write!(fmt, "File is too short to contain a parquet footer"),
            Error::BadMagic => write!(fmt, "Footer does not end in the parquet magic"),
            Error::BadMetadataLength(length) => {
                write!(fmt, "Metadata length {length} does not fit in the file")
            }
            Error::Thrift(message) => write!(fmt, "Malformed thrift data: {message}"),
            Error::UnsupportedEncoding(encoding) => {
                write!(fmt, "Encoding {encoding:?} is not supported")
            }
            Error::UnsupportedCodec(codec) => {
                write!(fmt, "Compression codec {codec:?} is not supported")
            }
            Error::UnsupportedType(message) => write!(fmt, "Unsupported type: {message}"),
            Error::UnsupportedConverted(converted) => {
                write!(fmt, "Converted type {converted:?} is not supported")
            }
            Error::BitpackOutOfBounds => {
                write!(fmt, "Bit-packed run reads past the end of the buffer")
            }
            Error::DeltaDecode(message) => {
                write!(fmt, "Malformed DELTA_BINARY_PACKED data: {message}")
            }
            Error::Schema(message) => write!(fmt, "Invalid schema: {message}"),
            Error::ExternalFile(path) => {
                write!(fmt, "Column chunk stored in external file {path:?}")
            }
            Error::ColumnTooLarge(column, size) => {
                write!(
                    fmt,
                    "Column chunk {column:?} is {size} bytes, above the 1 GiB guard"
                )
            }
            Error::PrefetchMiss(start, end) => {
                write!(fmt, "No prefetched range covers bytes [{start}, {end})")
            }
            Error::Source(message) => write!(fmt, "Byte source error: {message}"),
            Error::FeatureNotActive(feature, message) => {
                write!(
                    fmt,
                    "The feature {feature:?} is not active: {message}. Enable it in Cargo.toml or provide a custom decompressor"
                )
            }
            Error::OutOfSpec(message) => write!(fmt, "File out of specification: {message}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Source(format!("underlying IO error: {e}"))
    }
}

#[cfg(feature = "snappy")]
impl From<snap::Error> for Error {
    fn from(e: snap::Error) -> Error {
        Error::OutOfSpec(format!("underlying snap error: {e}"))
    }
}

#[cfg(feature = "lz4")]
impl From<lz4_flex::block::DecompressError> for Error {
    fn from(e: lz4_flex::block::DecompressError) -> Error {
        Error::OutOfSpec(format!("underlying lz4 error: {e}"))
    }
}

/// A specialized `Result` for errors of this crate.
pub type Result<T> = std::result::Result<T, Error>;
