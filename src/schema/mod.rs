//! The parquet schema: flat elements as stored in the footer and the tree
//! built from them, with the repetition/definition-level model.

mod from_thrift;
pub mod tree;
pub mod types;

pub use tree::{
    is_flat_column, max_definition_level, max_repetition_level, SchemaNode, SchemaTree,
};
pub use types::{
    ConvertedType, LogicalType, PhysicalType, Repetition, SchemaElement, TimeUnit,
};
