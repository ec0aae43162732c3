//! A minimal in-memory parquet writer, enough to exercise the read path:
//! thrift compact emission, v1/v2 page framing and the footer layout.

/// A thrift compact value to emit.
#[derive(Debug, Clone)]
pub enum F {
    Bool(bool),
    I32(i32),
    I64(i64),
    Bin(Vec<u8>),
    /// Element type nibble plus elements.
    List(u8, Vec<F>),
    /// `(field id, value)` pairs.
    Struct(Vec<(i16, F)>),
}

pub fn string(value: &str) -> F {
    F::Bin(value.as_bytes().to_vec())
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn zigzag32(value: i32) -> u64 {
    ((value << 1) ^ (value >> 31)) as u32 as u64
}

fn zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

fn type_nibble(value: &F) -> u8 {
    match value {
        F::Bool(true) => 1,
        F::Bool(false) => 2,
        F::I32(_) => 5,
        F::I64(_) => 6,
        F::Bin(_) => 8,
        F::List(..) => 9,
        F::Struct(_) => 12,
    }
}

fn write_value(out: &mut Vec<u8>, value: &F) {
    match value {
        // in field position the value lives in the type nibble
        F::Bool(_) => {}
        F::I32(v) => write_varint(out, zigzag32(*v)),
        F::I64(v) => write_varint(out, zigzag64(*v)),
        F::Bin(bytes) => {
            write_varint(out, bytes.len() as u64);
            out.extend_from_slice(bytes);
        }
        F::List(element_type, items) => {
            if items.len() < 15 {
                out.push(((items.len() as u8) << 4) | element_type);
            } else {
                out.push(0xF0 | element_type);
                write_varint(out, items.len() as u64);
            }
            for item in items {
                match item {
                    F::Bool(v) => out.push(if *v { 1 } else { 2 }),
                    other => write_value(out, other),
                }
            }
        }
        F::Struct(fields) => write_struct_body(out, fields),
    }
}

fn write_struct_body(out: &mut Vec<u8>, fields: &[(i16, F)]) {
    let mut last_id = 0i16;
    for (id, value) in fields {
        let delta = id - last_id;
        let nibble = type_nibble(value);
        if (1..=15).contains(&delta) {
            out.push(((delta as u8) << 4) | nibble);
        } else {
            out.push(nibble);
            write_varint(out, zigzag32(*id as i32));
        }
        last_id = *id;
        write_value(out, value);
    }
    out.push(0);
}

pub fn write_struct(fields: &[(i16, F)]) -> Vec<u8> {
    let mut out = vec![];
    write_struct_body(&mut out, fields);
    out
}

// ---- schema elements ----

pub const INT64: i32 = 2;
pub const BYTE_ARRAY: i32 = 6;

pub const REQUIRED: i32 = 0;
pub const OPTIONAL: i32 = 1;
pub const REPEATED: i32 = 2;

pub const PLAIN: i32 = 0;
pub const PLAIN_DICTIONARY: i32 = 2;
pub const RLE: i32 = 3;

pub const CONVERTED_UTF8: i32 = 0;
pub const CONVERTED_LIST: i32 = 3;

pub fn root_element(name: &str, num_children: i32) -> F {
    F::Struct(vec![(4, string(name)), (5, F::I32(num_children))])
}

pub fn group_element(name: &str, repetition: i32, num_children: i32, converted: Option<i32>) -> F {
    let mut fields = vec![
        (3, F::I32(repetition)),
        (4, string(name)),
        (5, F::I32(num_children)),
    ];
    if let Some(converted) = converted {
        fields.push((6, F::I32(converted)));
    }
    F::Struct(fields)
}

pub fn leaf_element(name: &str, physical: i32, repetition: i32, converted: Option<i32>) -> F {
    let mut fields = vec![
        (1, F::I32(physical)),
        (3, F::I32(repetition)),
        (4, string(name)),
    ];
    if let Some(converted) = converted {
        fields.push((6, F::I32(converted)));
    }
    F::Struct(fields)
}

// ---- pages ----

/// A `u32`-length-prefixed RLE region of `(run length, value)` runs.
pub fn rle_region(runs: &[(u32, u8)]) -> Vec<u8> {
    let mut body = vec![];
    for (run_length, value) in runs {
        write_varint(&mut body, (*run_length as u64) << 1);
        body.push(*value);
    }
    let mut out = (body.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(&body);
    out
}

pub fn plain_i64_values(values: &[i64]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

pub fn plain_byte_array_values(values: &[&[u8]]) -> Vec<u8> {
    let mut out = vec![];
    for value in values {
        out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        out.extend_from_slice(value);
    }
    out
}

/// A v1 data page: thrift header then the (uncompressed) body.
pub fn data_page_v1(num_values: i32, encoding: i32, body: &[u8]) -> Vec<u8> {
    let header = write_struct(&[
        (1, F::I32(0)), // DATA_PAGE
        (2, F::I32(body.len() as i32)),
        (3, F::I32(body.len() as i32)),
        (
            5,
            F::Struct(vec![
                (1, F::I32(num_values)),
                (2, F::I32(encoding)),
                (3, F::I32(RLE)),
                (4, F::I32(RLE)),
            ]),
        ),
    ]);
    let mut out = header;
    out.extend_from_slice(body);
    out
}

/// A v2 data page: levels stored outside the (here absent) compression.
pub fn data_page_v2(
    num_values: i32,
    num_nulls: i32,
    num_rows: i32,
    encoding: i32,
    rep_levels: &[u8],
    def_levels: &[u8],
    values: &[u8],
) -> Vec<u8> {
    let body_len = (rep_levels.len() + def_levels.len() + values.len()) as i32;
    let header = write_struct(&[
        (1, F::I32(3)), // DATA_PAGE_V2
        (2, F::I32(body_len)),
        (3, F::I32(body_len)),
        (
            8,
            F::Struct(vec![
                (1, F::I32(num_values)),
                (2, F::I32(num_nulls)),
                (3, F::I32(num_rows)),
                (4, F::I32(encoding)),
                (5, F::I32(def_levels.len() as i32)),
                (6, F::I32(rep_levels.len() as i32)),
                (7, F::Bool(false)),
            ]),
        ),
    ]);
    let mut out = header;
    out.extend_from_slice(rep_levels);
    out.extend_from_slice(def_levels);
    out.extend_from_slice(values);
    out
}

pub fn dictionary_page(num_values: i32, body: &[u8]) -> Vec<u8> {
    let header = write_struct(&[
        (1, F::I32(2)), // DICTIONARY_PAGE
        (2, F::I32(body.len() as i32)),
        (3, F::I32(body.len() as i32)),
        (
            7,
            F::Struct(vec![(1, F::I32(num_values)), (2, F::I32(PLAIN_DICTIONARY))]),
        ),
    ]);
    let mut out = header;
    out.extend_from_slice(body);
    out
}

// ---- files ----

pub struct ColumnChunkSpec {
    pub path: Vec<&'static str>,
    pub physical: i32,
    /// Complete pages, dictionary page (if any) first.
    pub pages: Vec<Vec<u8>>,
    pub dict_pages: usize,
    pub num_values: i64,
}

pub struct FileBuilder {
    bytes: Vec<u8>,
    schema: Vec<F>,
    row_groups: Vec<F>,
    num_rows: i64,
}

impl FileBuilder {
    pub fn new(schema: Vec<F>) -> Self {
        Self {
            bytes: b"PAR1".to_vec(),
            schema,
            row_groups: vec![],
            num_rows: 0,
        }
    }

    pub fn row_group(&mut self, columns: Vec<ColumnChunkSpec>, num_rows: i64) {
        let mut chunks = vec![];
        let mut total_size = 0i64;
        for column in columns {
            let start = self.bytes.len() as i64;
            let dict_len: usize = column.pages[..column.dict_pages]
                .iter()
                .map(|page| page.len())
                .sum();
            let total_len: usize = column.pages.iter().map(|page| page.len()).sum();
            for page in &column.pages {
                self.bytes.extend_from_slice(page);
            }
            total_size += total_len as i64;

            let mut meta = vec![
                (1, F::I32(column.physical)),
                (
                    3,
                    F::List(8, column.path.iter().map(|&part| string(part)).collect()),
                ),
                (4, F::I32(0)), // UNCOMPRESSED
                (5, F::I64(column.num_values)),
                (6, F::I64(total_len as i64)),
                (7, F::I64(total_len as i64)),
                (9, F::I64(start + dict_len as i64)),
            ];
            if column.dict_pages > 0 {
                meta.push((11, F::I64(start)));
            }
            chunks.push(F::Struct(vec![
                (2, F::I64(start)),
                (3, F::Struct(meta)),
            ]));
        }
        self.row_groups.push(F::Struct(vec![
            (1, F::List(12, chunks)),
            (2, F::I64(total_size)),
            (3, F::I64(num_rows)),
        ]));
        self.num_rows += num_rows;
    }

    pub fn finish(self) -> Vec<u8> {
        let metadata = write_struct(&[
            (1, F::I32(2)),
            (2, F::List(12, self.schema)),
            (3, F::I64(self.num_rows)),
            (4, F::List(12, self.row_groups)),
            (6, string("parquet-native test builder")),
        ]);
        let mut bytes = self.bytes;
        let metadata_length = metadata.len() as u32;
        bytes.extend_from_slice(&metadata);
        bytes.extend_from_slice(&metadata_length.to_le_bytes());
        bytes.extend_from_slice(b"PAR1");
        bytes
    }
}

/// `rowgroups.parquet`: one required INT64 column `v` holding 1..=15 over
/// three row groups.
pub fn rowgroups_file() -> Vec<u8> {
    let mut builder = FileBuilder::new(vec![
        root_element("schema", 1),
        leaf_element("v", INT64, REQUIRED, None),
    ]);
    for group in 0..3 {
        let values: Vec<i64> = (group * 5 + 1..=group * 5 + 5).collect();
        builder.row_group(
            vec![ColumnChunkSpec {
                path: vec!["v"],
                physical: INT64,
                pages: vec![data_page_v1(5, PLAIN, &plain_i64_values(&values))],
                dict_pages: 0,
                num_values: 5,
            }],
            5,
        );
    }
    builder.finish()
}
