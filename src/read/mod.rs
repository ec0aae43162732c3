//! Reading: from a byte source to materialised rows.

mod column;
pub mod levels;
mod metadata;
mod page;
mod plan;
mod prefetch;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::warn;

pub use metadata::{deserialize_metadata, read_metadata, read_metadata_with_fetch};
pub use plan::{plan_read, ByteRange, GroupPlan, QueryPlan};
pub use prefetch::PrefetchBuffer;

use crate::compression::{Decompressor, DefaultDecompressor};
use crate::deserialize::{assemble_nested, Parsers};
use crate::error::{Error, Result};
use crate::metadata::FileMetaData;
use crate::schema::tree::{is_flat_column, max_definition_level, max_repetition_level};
use crate::schema::types::Repetition;
use crate::schema::{SchemaNode, SchemaTree};
use crate::source::ByteSource;
use crate::value::Value;

use column::{Chunk, ColumnDecoder};

/// The shape of the rows handed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowFormat {
    /// Each row is a positional [`Value::List`].
    #[default]
    Array,
    /// Each row is a [`Value::Record`] keyed by top-level column name.
    Object,
}

/// A decoded stretch of one column, handed to `on_page`/`on_chunk`.
#[derive(Debug)]
pub struct PageEvent<'a> {
    /// Top-level dotted column name.
    pub column: &'a str,
    /// First row of this stretch, as an index into the file.
    pub row_start: u64,
    pub row_end: u64,
    pub values: &'a [Value],
}

pub type EventCallback = Box<dyn FnMut(PageEvent<'_>) + Send>;

/// Options of [`read`].
pub struct ReadOptions {
    pub source: Arc<dyn ByteSource>,
    /// Reuse of already-parsed metadata; read from `source` when `None`.
    pub metadata: Option<FileMetaData>,
    /// Top-level column names to materialise; all when `None`.
    pub columns: Option<Vec<String>>,
    pub row_start: u64,
    /// Exclusive; to the end of the file when `None`.
    pub row_end: Option<u64>,
    /// Decode un-annotated byte arrays as UTF-8 strings.
    pub utf8: bool,
    pub row_format: RowFormat,
    pub parsers: Parsers,
    pub decompressor: Arc<dyn Decompressor>,
    /// Called once per decoded column stretch, in column-within-group, then
    /// group order.
    pub on_chunk: Option<EventCallback>,
    /// Called once per decoded page stretch of each column, in strictly
    /// increasing row order per column.
    pub on_page: Option<EventCallback>,
}

impl ReadOptions {
    pub fn new(source: Arc<dyn ByteSource>) -> Self {
        Self {
            source,
            metadata: None,
            columns: None,
            row_start: 0,
            row_end: None,
            utf8: true,
            row_format: RowFormat::default(),
            parsers: Parsers::default(),
            decompressor: Arc::new(DefaultDecompressor),
            on_chunk: None,
            on_page: None,
        }
    }
}

/// Reads the selected rows, resolving to them once every overlapping row
/// group decoded. Dropping the returned future cancels in-flight fetches.
pub async fn read(options: ReadOptions) -> Result<Vec<Value>> {
    let ReadOptions {
        source,
        metadata,
        columns,
        row_start,
        row_end,
        utf8,
        row_format,
        parsers,
        decompressor,
        mut on_chunk,
        mut on_page,
    } = options;

    let metadata = match metadata {
        Some(metadata) => metadata,
        None => read_metadata(&*source).await?,
    };
    let tree = SchemaTree::try_new(&metadata.schema)?;
    let plan = plan_read(&metadata, row_start, row_end)?;

    let prefetch = PrefetchBuffer::new(source.clone(), &plan.fetches);
    prefetch.prefetch().await?;

    let requested: Option<HashSet<&str>> = columns
        .as_ref()
        .map(|names| names.iter().map(String::as_str).collect());

    let mut rows: Vec<Value> = vec![];
    for group_plan in &plan.groups {
        let row_group = &metadata.row_groups[group_plan.index];

        // one decoder per selected column chunk
        let mut tasks: Vec<(ColumnDecoder, ByteRange)> = vec![];
        for (chunk_meta, range) in row_group.columns.iter().zip(&group_plan.ranges) {
            let meta = chunk_meta.meta_data()?;
            let top_level = meta
                .path_in_schema
                .first()
                .ok_or_else(|| Error::Schema("column with an empty path".to_string()))?;
            if let Some(requested) = &requested {
                if !requested.contains(top_level.as_str()) {
                    continue;
                }
            }
            let Some(range) = range else {
                // skipped by the size guard, already warned by the planner
                continue;
            };

            let nodes = tree.path_lookup(&meta.path_in_schema)?;
            let leaf = *nodes.last().unwrap();
            let rep_path = nodes
                .iter()
                .map(|node| node.element.repetition.unwrap_or(Repetition::Required))
                .collect();
            tasks.push((
                ColumnDecoder {
                    name: meta.column_name(),
                    element: &leaf.element,
                    rep_path,
                    max_rep: max_repetition_level(&nodes),
                    max_def: max_definition_level(&nodes),
                    flat: is_flat_column(&nodes),
                    codec: meta.codec,
                    num_values: meta.num_values,
                    parsers: &parsers,
                    decompressor: &*decompressor,
                    utf8,
                },
                *range,
            ));
        }

        let results: Vec<(String, Vec<Chunk>)> =
            futures::future::try_join_all(tasks.into_iter().map(|(decoder, range)| {
                let prefetch = &prefetch;
                async move {
                    let buffer = prefetch.slice(range.start, range.end).await?;
                    let chunks = column::read_column_chunk(
                        &decoder,
                        &buffer,
                        group_plan.select_start,
                        group_plan.select_end,
                    )?;
                    Ok::<_, Error>((decoder.name, chunks))
                }
            }))
            .await?;

        for (name, chunks) in &results {
            for callback in [&mut on_page, &mut on_chunk] {
                if let Some(callback) = callback {
                    for chunk in chunks.iter().filter(|chunk| !chunk.placeholder) {
                        callback(PageEvent {
                            column: name,
                            row_start: group_plan.group_start + chunk.row_start,
                            row_end: group_plan.group_start + chunk.row_end(),
                            values: &chunk.values,
                        });
                    }
                }
            }
        }

        let mut data: HashMap<String, Vec<Value>> = results
            .into_iter()
            .map(|(name, chunks)| {
                let values = chunks
                    .into_iter()
                    .flat_map(|chunk| chunk.values)
                    .collect::<Vec<_>>();
                (name, values)
            })
            .collect();

        // assemble top-level fields in schema order and slice the selection
        let mut columns_out: Vec<(&str, Vec<Value>)> = vec![];
        for child in &tree.root.children {
            let name = child.element.name.as_str();
            if let Some(requested) = &requested {
                if !requested.contains(name) {
                    continue;
                }
            }
            let values = if child.children.is_empty() {
                match data.remove(name) {
                    Some(values) => values,
                    None => continue,
                }
            } else {
                let mut leaves = vec![];
                collect_leaf_paths(child, &mut leaves);
                let present = leaves.iter().filter(|leaf| data.contains_key(*leaf)).count();
                if present == 0 {
                    continue;
                }
                if present < leaves.len() {
                    warn!("skipping column {name:?}: not all of its leaves were decoded");
                    continue;
                }
                assemble_nested(&mut data, child, 0)?;
                data.remove(&child.dotted_path())
                    .ok_or_else(|| Error::Schema(format!("column {name:?} failed to assemble")))?
            };

            let start = group_plan.select_start as usize;
            let end = (group_plan.select_end as usize).min(values.len());
            if start > end {
                return Err(Error::Schema(format!(
                    "column {name:?} holds {} rows, selection starts at {start}",
                    values.len()
                )));
            }
            let mut values = values;
            values.truncate(end);
            values.drain(..start);
            columns_out.push((name, values));
        }

        // transpose the columns into rows
        let group_rows = columns_out
            .first()
            .map(|(_, values)| values.len())
            .unwrap_or(0);
        if let Some((name, values)) = columns_out
            .iter()
            .find(|(_, values)| values.len() != group_rows)
        {
            return Err(Error::Schema(format!(
                "column {name:?} holds {} rows, expected {group_rows}",
                values.len()
            )));
        }
        let mut transposed: Vec<Vec<Value>> = (0..group_rows)
            .map(|_| Vec::with_capacity(columns_out.len()))
            .collect();
        let names = columns_out
            .iter()
            .map(|(name, _)| name.to_string())
            .collect::<Vec<_>>();
        for (_, values) in columns_out {
            for (row, value) in transposed.iter_mut().zip(values) {
                row.push(value);
            }
        }
        match row_format {
            RowFormat::Array => rows.extend(transposed.into_iter().map(Value::List)),
            RowFormat::Object => rows.extend(transposed.into_iter().map(|values| {
                Value::Record(names.iter().cloned().zip(values).collect())
            })),
        }
    }

    Ok(rows)
}

/// [`read`] with rows as [`Value::Record`]s keyed by column name.
pub async fn read_objects(options: ReadOptions) -> Result<Vec<Value>> {
    read(ReadOptions {
        row_format: RowFormat::Object,
        ..options
    })
    .await
}

/// [`read`] with rows as positional [`Value::List`]s.
pub async fn read_arrays(options: ReadOptions) -> Result<Vec<Value>> {
    read(ReadOptions {
        row_format: RowFormat::Array,
        ..options
    })
    .await
}

fn collect_leaf_paths(node: &SchemaNode, out: &mut Vec<String>) {
    if node.children.is_empty() {
        out.push(node.dotted_path());
    }
    for child in &node.children {
        collect_leaf_paths(child, out);
    }
}
