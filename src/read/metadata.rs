//! Reading of the footer and the file metadata.

use crate::error::{Error, Result};
use crate::metadata::FileMetaData;
use crate::source::ByteSource;
use crate::thrift::CompactReader;
use crate::{DEFAULT_FOOTER_READ_SIZE, FOOTER_SIZE, PARQUET_MAGIC};

// Layout of a parquet file:
// +---------------------------+-----+----+
// |      rest of file         |  B  | A  |
// +---------------------------+-----+----+
// where A is the 8-byte footer (u32 LE metadata length + "PAR1") and B the
// thrift-encoded metadata.

/// Deserializes [`FileMetaData`] from the trailing bytes of a file. `buffer`
/// must end at the end of the file and contain the whole metadata.
pub fn deserialize_metadata(buffer: &[u8]) -> Result<FileMetaData> {
    let length = buffer.len();
    if (length as u64) < FOOTER_SIZE {
        return Err(Error::ShortFile);
    }
    if buffer[length - 4..] != PARQUET_MAGIC {
        return Err(Error::BadMagic);
    }
    let metadata_length: [u8; 4] = buffer[length - 8..length - 4].try_into().unwrap();
    let metadata_length = u32::from_le_bytes(metadata_length);
    if metadata_length as u64 > length as u64 - FOOTER_SIZE {
        return Err(Error::BadMetadataLength(metadata_length));
    }

    let start = length - FOOTER_SIZE as usize - metadata_length as usize;
    let mut reader = CompactReader::new(&buffer[start..length - FOOTER_SIZE as usize]);
    let record = reader.read_struct()?;
    FileMetaData::try_from_thrift(&record, metadata_length)
}

/// Reads a file's metadata from a byte source, fetching up to
/// `initial_fetch` bytes from the end first and re-fetching once when the
/// metadata is larger than that window.
pub async fn read_metadata_with_fetch(
    source: &dyn ByteSource,
    initial_fetch: u64,
) -> Result<FileMetaData> {
    let file_size = source.byte_length();
    if file_size < FOOTER_SIZE {
        return Err(Error::ShortFile);
    }

    let fetch = std::cmp::min(initial_fetch.max(FOOTER_SIZE), file_size);
    let buffer = source.slice(file_size - fetch, file_size).await?;

    if buffer[buffer.len() - 4..] != PARQUET_MAGIC {
        return Err(Error::BadMagic);
    }
    let metadata_length: [u8; 4] = buffer[buffer.len() - 8..buffer.len() - 4]
        .try_into()
        .unwrap();
    let metadata_length = u32::from_le_bytes(metadata_length);
    let footer_length = metadata_length as u64 + FOOTER_SIZE;
    if footer_length > file_size {
        return Err(Error::BadMetadataLength(metadata_length));
    }

    if footer_length <= fetch {
        // the whole metadata is already in the window
        deserialize_metadata(&buffer)
    } else {
        let buffer = source.slice(file_size - footer_length, file_size).await?;
        deserialize_metadata(&buffer)
    }
}

/// Reads a file's metadata, fetching up to 512 KiB from the end first.
pub async fn read_metadata(source: &dyn ByteSource) -> Result<FileMetaData> {
    read_metadata_with_fetch(source, DEFAULT_FOOTER_READ_SIZE).await
}
