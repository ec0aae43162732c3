//! The query planner: from metadata and a row selection to the byte ranges
//! to fetch.

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::metadata::FileMetaData;

/// When a row group's columns span less than this, one aggregated fetch
/// replaces the per-column fetches.
const AGGREGATE_FETCH_LIMIT: u64 = 32 * 1024 * 1024;

/// Compressed column chunks above this size are skipped, not allocated.
pub(crate) const MAX_COLUMN_SIZE: u64 = 1 << 30;

/// A half-open byte range `[start, end)` within the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn length(&self) -> u64 {
        self.end - self.start
    }
}

/// The per-row-group part of a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPlan {
    /// Index of the row group in the file metadata.
    pub index: usize,
    /// Row index of the group's first row within the file.
    pub group_start: u64,
    pub group_rows: u64,
    /// First selected row, relative to `group_start`.
    pub select_start: u64,
    /// End of the selection, relative to `group_start`.
    pub select_end: u64,
    /// One range per column chunk; `None` when the column is skipped by the
    /// size guard.
    pub ranges: Vec<Option<ByteRange>>,
}

/// The byte ranges a read will need, grouped by row group.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// The fetches to issue, in plan order.
    pub fetches: Vec<ByteRange>,
    pub groups: Vec<GroupPlan>,
}

/// Plans the fetches for rows `[row_start, row_end)` over every row group
/// that overlaps the selection.
pub fn plan_read(
    metadata: &FileMetaData,
    row_start: u64,
    row_end: Option<u64>,
) -> Result<QueryPlan> {
    let row_end = row_end.unwrap_or(u64::MAX);
    let mut fetches = vec![];
    let mut groups = vec![];

    let mut group_start = 0u64;
    for (index, row_group) in metadata.row_groups.iter().enumerate() {
        let group_rows = row_group.num_rows;
        let overlaps = group_start < row_end && group_start + group_rows > row_start;
        if !overlaps {
            group_start += group_rows;
            continue;
        }

        let mut ranges = Vec::with_capacity(row_group.columns.len());
        for column in &row_group.columns {
            if let Some(path) = &column.file_path {
                return Err(Error::ExternalFile(path.clone()));
            }
            let meta = column.meta_data()?;
            let (start, end) = column.byte_range()?;
            if end < start {
                return Err(Error::oos("column chunk with negative length"));
            }
            if end - start > MAX_COLUMN_SIZE {
                // too large to allocate; the column is skipped, not fatal
                warn!(
                    "{}",
                    Error::ColumnTooLarge(meta.column_name(), end - start)
                );
                ranges.push(None);
                continue;
            }
            ranges.push(Some(ByteRange { start, end }));
        }

        let included = ranges.iter().flatten().copied().collect::<Vec<_>>();
        if let (Some(min_start), Some(max_end)) = (
            included.iter().map(|range| range.start).min(),
            included.iter().map(|range| range.end).max(),
        ) {
            if max_end - min_start < AGGREGATE_FETCH_LIMIT {
                fetches.push(ByteRange {
                    start: min_start,
                    end: max_end,
                });
            } else {
                fetches.extend(included);
            }
        }

        groups.push(GroupPlan {
            index,
            group_start,
            group_rows,
            select_start: row_start.saturating_sub(group_start).min(group_rows),
            select_end: row_end.saturating_sub(group_start).min(group_rows),
            ranges,
        });
        group_start += group_rows;
    }

    debug!(
        "planned {} fetches over {} row groups",
        fetches.len(),
        groups.len()
    );
    Ok(QueryPlan { fetches, groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::Compression;
    use crate::metadata::{ColumnChunkMetaData, ColumnMetaData, RowGroupMetaData};
    use crate::schema::types::PhysicalType;

    fn column(name: &str, data_offset: u64, size: u64) -> ColumnChunkMetaData {
        ColumnChunkMetaData {
            file_path: None,
            file_offset: data_offset,
            meta_data: Some(ColumnMetaData {
                physical_type: PhysicalType::Int64,
                path_in_schema: vec![name.to_string()],
                codec: Compression::Uncompressed,
                num_values: 10,
                total_uncompressed_size: size,
                total_compressed_size: size,
                data_page_offset: data_offset,
                index_page_offset: None,
                dictionary_page_offset: None,
            }),
            offset_index_offset: None,
            offset_index_length: None,
            column_index_offset: None,
            column_index_length: None,
        }
    }

    fn metadata(groups: Vec<RowGroupMetaData>) -> FileMetaData {
        FileMetaData {
            version: 2,
            schema: vec![],
            num_rows: groups.iter().map(|g| g.num_rows).sum(),
            row_groups: groups,
            created_by: None,
            metadata_length: 0,
        }
    }

    fn group(columns: Vec<ColumnChunkMetaData>, num_rows: u64) -> RowGroupMetaData {
        RowGroupMetaData {
            total_byte_size: 0,
            columns,
            num_rows,
            file_offset: None,
            total_compressed_size: None,
        }
    }

    #[test]
    fn aggregates_small_groups() {
        let metadata = metadata(vec![group(
            vec![column("a", 4, 100), column("b", 104, 100)],
            10,
        )]);
        let plan = plan_read(&metadata, 0, None).unwrap();
        assert_eq!(plan.fetches, vec![ByteRange { start: 4, end: 204 }]);
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].select_start, 0);
        assert_eq!(plan.groups[0].select_end, 10);
    }

    #[test]
    fn splits_large_groups() {
        let size = AGGREGATE_FETCH_LIMIT;
        let metadata = metadata(vec![group(
            vec![column("a", 0, size), column("b", size, size)],
            10,
        )]);
        let plan = plan_read(&metadata, 0, None).unwrap();
        assert_eq!(plan.fetches.len(), 2);
    }

    #[test]
    fn row_selection_intersects_groups() {
        let metadata = metadata(vec![
            group(vec![column("a", 0, 10)], 5),
            group(vec![column("a", 10, 10)], 5),
            group(vec![column("a", 20, 10)], 5),
        ]);
        let plan = plan_read(&metadata, 6, Some(11)).unwrap();
        assert_eq!(plan.groups.len(), 2);
        assert_eq!(plan.groups[0].index, 1);
        assert_eq!(plan.groups[0].select_start, 1);
        assert_eq!(plan.groups[0].select_end, 5);
        assert_eq!(plan.groups[1].index, 2);
        assert_eq!(plan.groups[1].select_start, 0);
        assert_eq!(plan.groups[1].select_end, 1);
    }

    #[test]
    fn external_file_is_rejected() {
        let mut chunk = column("a", 0, 10);
        chunk.file_path = Some("elsewhere.parquet".to_string());
        let metadata = metadata(vec![group(vec![chunk], 5)]);
        assert_eq!(
            plan_read(&metadata, 0, None),
            Err(Error::ExternalFile("elsewhere.parquet".to_string()))
        );
    }

    #[test]
    fn oversized_column_is_skipped() {
        let metadata = metadata(vec![group(
            vec![column("a", 0, MAX_COLUMN_SIZE + 1), column("b", 0, 8)],
            5,
        )]);
        let plan = plan_read(&metadata, 0, None).unwrap();
        assert_eq!(plan.groups[0].ranges[0], None);
        assert!(plan.groups[0].ranges[1].is_some());
        assert_eq!(plan.fetches.len(), 1);
    }
}
