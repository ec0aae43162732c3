#![forbid(unsafe_code)]
//! Async, pure-Rust decoder of Apache Parquet files into native values.
//!
//! Given random-access read capability over a file (local, remote or
//! in-memory, abstracted by [`source::ByteSource`]), this crate parses the
//! footer, plans the byte ranges a row/column selection needs, prefetches
//! them, decodes v1 and v2 data pages, and assembles Dremel-encoded nested
//! records into [`value::Value`] rows.
//!
//! ```no_run
//! # async fn example() -> parquet_native::error::Result<()> {
//! use std::sync::Arc;
//! use parquet_native::read::{read_objects, ReadOptions};
//! use parquet_native::source::MemorySource;
//!
//! let source = Arc::new(MemorySource::new(std::fs::read("file.parquet")?));
//! let rows = read_objects(ReadOptions::new(source)).await?;
//! # Ok(())
//! # }
//! ```

pub mod compression;
pub mod deserialize;
pub mod encoding;
pub mod error;
pub mod metadata;
pub mod page;
pub mod read;
pub mod schema;
pub mod source;
pub mod thrift;
pub mod types;
pub mod value;

/// Size of the parquet trailer: a `u32` metadata length plus the magic.
const FOOTER_SIZE: u64 = 8;
const PARQUET_MAGIC: [u8; 4] = [b'P', b'A', b'R', b'1'];

/// The number of bytes read at the end of the parquet file on first read.
const DEFAULT_FOOTER_READ_SIZE: u64 = 512 * 1024;
