use std::sync::{Arc, Mutex};

use parquet_native::error::Error;
use parquet_native::metadata::FileMetaData;
use parquet_native::read::{
    plan_read, read, read_arrays, read_metadata, read_metadata_with_fetch, read_objects,
    PageEvent, ReadOptions,
};
use parquet_native::source::MemorySource;
use parquet_native::value::Value;

use super::build::*;

fn options(bytes: Vec<u8>) -> ReadOptions {
    ReadOptions::new(Arc::new(MemorySource::new(bytes)))
}

fn int64_rows(rows: &[i64]) -> Vec<Value> {
    rows.iter()
        .map(|value| Value::List(vec![Value::Int64(*value)]))
        .collect()
}

#[tokio::test]
async fn rowgroups_full_scan() {
    let rows = read_objects(options(rowgroups_file())).await.unwrap();
    let expected: Vec<Value> = (1..=15)
        .map(|value| Value::Record(vec![("v".to_string(), Value::Int64(value))]))
        .collect();
    assert_eq!(rows, expected);
}

#[tokio::test]
async fn rowgroups_row_range() {
    let mut options = options(rowgroups_file());
    options.row_start = 3;
    options.row_end = Some(9);
    let rows = read_arrays(options).await.unwrap();
    assert_eq!(rows, int64_rows(&[4, 5, 6, 7, 8, 9]));
}

#[tokio::test]
async fn rowgroups_tail_range() {
    let mut options = options(rowgroups_file());
    options.row_start = 13;
    let rows = read_arrays(options).await.unwrap();
    assert_eq!(rows, int64_rows(&[14, 15]));
}

#[tokio::test]
async fn rowgroups_metadata_round_trip() {
    let source = Arc::new(MemorySource::new(rowgroups_file()));
    let metadata: FileMetaData = read_metadata(&*source).await.unwrap();
    assert_eq!(metadata.num_rows, 15);
    assert_eq!(metadata.row_groups.len(), 3);
    assert_eq!(metadata.schema.len(), 2);
    assert_eq!(
        metadata.created_by.as_deref(),
        Some("parquet-native test builder")
    );

    // a pre-parsed metadata short-circuits the footer fetch
    let mut options = ReadOptions::new(source);
    options.metadata = Some(metadata);
    options.row_end = Some(2);
    let rows = read(options).await.unwrap();
    assert_eq!(rows, int64_rows(&[1, 2]));
}

#[tokio::test]
async fn small_initial_fetch_refetches() {
    let bytes = rowgroups_file();
    let source = MemorySource::new(bytes);
    // 9 bytes hold the trailer but not the metadata
    let metadata = read_metadata_with_fetch(&source, 9).await.unwrap();
    assert_eq!(metadata.num_rows, 15);
}

#[tokio::test]
async fn plan_covers_all_groups() {
    let source = MemorySource::new(rowgroups_file());
    let metadata = read_metadata(&source).await.unwrap();
    let plan = plan_read(&metadata, 0, None).unwrap();
    assert_eq!(plan.groups.len(), 3);
    assert_eq!(plan.fetches.len(), 3);
    assert_eq!(plan.groups[1].group_start, 5);
    assert_eq!(plan.groups[1].select_end, 5);
}

fn two_column_file() -> Vec<u8> {
    let mut builder = FileBuilder::new(vec![
        root_element("schema", 2),
        leaf_element("v", INT64, REQUIRED, None),
        leaf_element("s", BYTE_ARRAY, REQUIRED, Some(CONVERTED_UTF8)),
    ]);
    builder.row_group(
        vec![
            ColumnChunkSpec {
                path: vec!["v"],
                physical: INT64,
                pages: vec![data_page_v1(2, PLAIN, &plain_i64_values(&[10, 20]))],
                dict_pages: 0,
                num_values: 2,
            },
            ColumnChunkSpec {
                path: vec!["s"],
                physical: BYTE_ARRAY,
                pages: vec![data_page_v1(
                    2,
                    PLAIN,
                    &plain_byte_array_values(&[b"foo", b"bar"]),
                )],
                dict_pages: 0,
                num_values: 2,
            },
        ],
        2,
    );
    builder.finish()
}

#[tokio::test]
async fn object_rows_follow_schema_order() {
    let rows = read_objects(options(two_column_file())).await.unwrap();
    assert_eq!(
        rows[0],
        Value::Record(vec![
            ("v".to_string(), Value::Int64(10)),
            ("s".to_string(), Value::String("foo".to_string())),
        ])
    );
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn column_selection_skips_columns() {
    let mut options = options(two_column_file());
    options.columns = Some(vec!["s".to_string()]);
    let rows = read_arrays(options).await.unwrap();
    assert_eq!(
        rows,
        vec![
            Value::List(vec![Value::String("foo".to_string())]),
            Value::List(vec![Value::String("bar".to_string())]),
        ]
    );
}

fn optional_file() -> Vec<u8> {
    let mut builder = FileBuilder::new(vec![
        root_element("schema", 1),
        leaf_element("v", INT64, OPTIONAL, None),
    ]);
    // values 1, null, 3: definition levels [1, 0, 1]
    let mut body = rle_region(&[(1, 1), (1, 0), (1, 1)]);
    body.extend_from_slice(&plain_i64_values(&[1, 3]));
    builder.row_group(
        vec![ColumnChunkSpec {
            path: vec!["v"],
            physical: INT64,
            pages: vec![data_page_v1(3, PLAIN, &body)],
            dict_pages: 0,
            num_values: 3,
        }],
        3,
    );
    builder.finish()
}

#[tokio::test]
async fn optional_column_expands_nulls() {
    let rows = read_arrays(options(optional_file())).await.unwrap();
    assert_eq!(
        rows,
        vec![
            Value::List(vec![Value::Int64(1)]),
            Value::List(vec![Value::Null]),
            Value::List(vec![Value::Int64(3)]),
        ]
    );
}

fn dictionary_file() -> Vec<u8> {
    let mut builder = FileBuilder::new(vec![
        root_element("schema", 1),
        leaf_element("s", BYTE_ARRAY, REQUIRED, Some(CONVERTED_UTF8)),
    ]);
    let dictionary = dictionary_page(2, &plain_byte_array_values(&[b"a", b"b"]));
    // indices [0, 1, 0, 1] at bit width 1: one RLE byte-width prefix, then
    // a bit-packed group of 8
    let body = vec![1u8, 0x03, 0b0000_1010];
    builder.row_group(
        vec![ColumnChunkSpec {
            path: vec!["s"],
            physical: BYTE_ARRAY,
            pages: vec![dictionary, data_page_v1(4, PLAIN_DICTIONARY, &body)],
            dict_pages: 1,
            num_values: 4,
        }],
        4,
    );
    builder.finish()
}

#[tokio::test]
async fn dictionary_column_dereferences() {
    let rows = read_arrays(options(dictionary_file())).await.unwrap();
    let expected: Vec<Value> = ["a", "b", "a", "b"]
        .iter()
        .map(|value| Value::List(vec![Value::String(value.to_string())]))
        .collect();
    assert_eq!(rows, expected);
}

fn v2_file() -> Vec<u8> {
    let mut builder = FileBuilder::new(vec![
        root_element("schema", 1),
        leaf_element("v", INT64, OPTIONAL, None),
    ]);
    // values 7, null: def levels [1, 0] as an un-prefixed RLE region
    let def_levels = vec![0x03, 0b0000_0001];
    let page = data_page_v2(2, 1, 2, PLAIN, &[], &def_levels, &plain_i64_values(&[7]));
    builder.row_group(
        vec![ColumnChunkSpec {
            path: vec!["v"],
            physical: INT64,
            pages: vec![page],
            dict_pages: 0,
            num_values: 2,
        }],
        2,
    );
    builder.finish()
}

#[tokio::test]
async fn data_page_v2_round_trip() {
    let rows = read_arrays(options(v2_file())).await.unwrap();
    assert_eq!(
        rows,
        vec![
            Value::List(vec![Value::Int64(7)]),
            Value::List(vec![Value::Null]),
        ]
    );
}

fn nested_list_file() -> Vec<u8> {
    let mut builder = FileBuilder::new(vec![
        root_element("schema", 1),
        group_element("l", OPTIONAL, 1, Some(CONVERTED_LIST)),
        group_element("list", REPEATED, 1, None),
        leaf_element("element", INT64, OPTIONAL, None),
    ]);
    // rows: [1, 2], null, [3]
    // definition levels [3, 3, 0, 3], repetition levels [0, 1, 0, 0]
    let mut body = rle_region(&[(1, 0), (1, 1), (2, 0)]);
    let def = rle_region(&[(2, 3), (1, 0), (1, 3)]);
    body.extend_from_slice(&def);
    body.extend_from_slice(&plain_i64_values(&[1, 2, 3]));
    builder.row_group(
        vec![ColumnChunkSpec {
            path: vec!["l", "list", "element"],
            physical: INT64,
            pages: vec![data_page_v1(4, PLAIN, &body)],
            dict_pages: 0,
            num_values: 4,
        }],
        3,
    );
    builder.finish()
}

#[tokio::test]
async fn nested_list_assembles() {
    let rows = read_arrays(options(nested_list_file())).await.unwrap();
    assert_eq!(
        rows,
        vec![
            Value::List(vec![Value::List(vec![Value::Int64(1), Value::Int64(2)])]),
            Value::List(vec![Value::Null]),
            Value::List(vec![Value::List(vec![Value::Int64(3)])]),
        ]
    );
}

#[tokio::test]
async fn callbacks_fire_in_order() {
    let events: Arc<Mutex<Vec<(String, u64, u64, usize)>>> = Arc::new(Mutex::new(vec![]));
    let chunk_events = events.clone();
    let mut options = options(rowgroups_file());
    options.on_chunk = Some(Box::new(move |event: PageEvent<'_>| {
        chunk_events.lock().unwrap().push((
            event.column.to_string(),
            event.row_start,
            event.row_end,
            event.values.len(),
        ));
    }));
    read(options).await.unwrap();

    let events = events.lock().unwrap();
    assert_eq!(
        *events,
        vec![
            ("v".to_string(), 0, 5, 5),
            ("v".to_string(), 5, 10, 5),
            ("v".to_string(), 10, 15, 5),
        ]
    );
}

#[tokio::test]
async fn page_events_ascend_per_column() {
    let rows_seen: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(vec![]));
    let page_rows = rows_seen.clone();
    let mut options = options(rowgroups_file());
    options.on_page = Some(Box::new(move |event: PageEvent<'_>| {
        page_rows.lock().unwrap().push(event.row_start);
    }));
    read(options).await.unwrap();
    let rows_seen = rows_seen.lock().unwrap();
    assert!(rows_seen.windows(2).all(|pair| pair[0] < pair[1]));
}

#[tokio::test]
async fn footer_errors() {
    let source = MemorySource::new(vec![1, 2, 3]);
    assert_eq!(read_metadata(&source).await, Err(Error::ShortFile));

    let source = MemorySource::new(b"PAR1xxxxPAR0".to_vec());
    assert_eq!(read_metadata(&source).await, Err(Error::BadMagic));

    let mut bytes = b"PAR1".to_vec();
    bytes.extend_from_slice(&100u32.to_le_bytes());
    bytes.extend_from_slice(b"PAR1");
    let source = MemorySource::new(bytes);
    assert_eq!(
        read_metadata(&source).await,
        Err(Error::BadMetadataLength(100))
    );
}

#[tokio::test]
async fn empty_selection_returns_no_rows() {
    let mut options = options(rowgroups_file());
    options.row_start = 100;
    let rows = read(options).await.unwrap();
    assert_eq!(rows, vec![]);
}
