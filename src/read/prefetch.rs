//! The prefetch buffer: pre-issued, memoised fetches of the planned ranges.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::debug;

use crate::error::{Error, Result};
use crate::source::ByteSource;

use super::plan::ByteRange;

type SharedFetch = Shared<BoxFuture<'static, Result<Bytes>>>;

/// Serves sub-ranges of a fixed list of pre-issued fetches. Each fetch runs
/// at most once; concurrent `slice` calls await the same in-flight result.
pub struct PrefetchBuffer {
    entries: Vec<(ByteRange, SharedFetch)>,
}

impl PrefetchBuffer {
    /// Wraps `source`, issuing one memoised fetch per planned range. Fetches
    /// only run when first polled; [`PrefetchBuffer::prefetch`] drives them
    /// all concurrently.
    pub fn new(source: Arc<dyn ByteSource>, ranges: &[ByteRange]) -> Self {
        let entries = ranges
            .iter()
            .map(|range| {
                let source = source.clone();
                let range = *range;
                let fetch = async move { source.slice(range.start, range.end).await }
                    .boxed()
                    .shared();
                (range, fetch)
            })
            .collect();
        Self { entries }
    }

    /// Drives all fetches concurrently to completion.
    pub async fn prefetch(&self) -> Result<()> {
        debug!("prefetching {} ranges", self.entries.len());
        let fetches = self.entries.iter().map(|(_, fetch)| fetch.clone());
        futures::future::try_join_all(fetches).await?;
        Ok(())
    }

    /// The bytes `[start, end)`, served from the unique prefetched range that
    /// covers them.
    pub async fn slice(&self, start: u64, end: u64) -> Result<Bytes> {
        let (range, fetch) = self
            .entries
            .iter()
            .find(|(range, _)| range.start <= start && end <= range.end)
            .ok_or(Error::PrefetchMiss(start, end))?;
        let buffer = fetch.clone().await?;
        if buffer.len() as u64 != range.length() {
            return Err(Error::Source(format!(
                "source returned {} bytes for a range of {}",
                buffer.len(),
                range.length()
            )));
        }
        Ok(buffer.slice((start - range.start) as usize..(end - range.start) as usize))
    }
}
