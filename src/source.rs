//! Random-access byte sources.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Error, Result};

/// Random-access read capability over a file: local, remote or in-memory.
///
/// Implementations over HTTP should issue a `Range` header per `slice` call.
/// A `206 Partial Content` response carries exactly the requested range; a
/// `200 OK` means the server ignores ranges, and the implementation must
/// downgrade to caching the entire body and slicing locally.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Total size in bytes, known before any [`ByteSource::slice`].
    fn byte_length(&self) -> u64;

    /// The bytes `[start, end)`. `end` is at most [`ByteSource::byte_length`].
    async fn slice(&self, start: u64, end: u64) -> Result<Bytes>;
}

/// A [`ByteSource`] over a buffer already in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Bytes,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    fn byte_length(&self) -> u64 {
        self.data.len() as u64
    }

    async fn slice(&self, start: u64, end: u64) -> Result<Bytes> {
        if start > end || end > self.data.len() as u64 {
            return Err(Error::Source(format!(
                "range [{start}, {end}) outside a buffer of {} bytes",
                self.data.len()
            )));
        }
        Ok(self.data.slice(start as usize..end as usize))
    }
}
