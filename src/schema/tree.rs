//! The schema tree and the repetition/definition-level model.

use crate::error::{Error, Result};

use super::types::{ConvertedType, LogicalType, Repetition, SchemaElement};

/// A node of the schema tree. Built once from the flat element list and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub element: SchemaElement,
    /// Names from the root (exclusive) to this node (inclusive). Empty for
    /// the root.
    pub path: Vec<String>,
    pub children: Vec<SchemaNode>,
    /// Number of flat elements in this subtree, this node included.
    pub count: usize,
}

impl SchemaNode {
    /// The dotted form of [`SchemaNode::path`], the key used for leaf data.
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }

    /// Whether this node annotates a list: a LIST converted/logical type over
    /// exactly one REPEATED child.
    pub fn is_list_like(&self) -> bool {
        let annotated = self.element.converted_type == Some(ConvertedType::List)
            || matches!(self.element.logical_type, Some(LogicalType::List));
        annotated
            && self.children.len() == 1
            && self.children[0].element.repetition == Some(Repetition::Repeated)
    }

    /// Whether this node annotates a map: a MAP converted/logical type over
    /// one REPEATED child holding a non-repeated key and a non-repeated value.
    pub fn is_map_like(&self) -> bool {
        let annotated = matches!(
            self.element.converted_type,
            Some(ConvertedType::Map) | Some(ConvertedType::MapKeyValue)
        ) || matches!(self.element.logical_type, Some(LogicalType::Map));
        if !annotated || self.children.len() != 1 {
            return false;
        }
        let key_value = &self.children[0];
        key_value.element.repetition == Some(Repetition::Repeated)
            && key_value.children.len() == 2
            && key_value.children[0].element.name == "key"
            && key_value.children[0].element.repetition != Some(Repetition::Repeated)
            && key_value.children[1].element.repetition != Some(Repetition::Repeated)
    }
}

/// The tree over a file's flat schema elements.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaTree {
    pub root: SchemaNode,
}

impl SchemaTree {
    /// Builds the tree by consuming the flat, depth-first element list.
    pub fn try_new(schema: &[SchemaElement]) -> Result<Self> {
        if schema.is_empty() {
            return Err(Error::Schema("empty schema".to_string()));
        }
        let (root, count) = build_tree(schema, 0, &[])?;
        if count != schema.len() {
            return Err(Error::Schema(format!(
                "schema tree consumed {count} of {} elements",
                schema.len()
            )));
        }
        Ok(Self { root })
    }

    /// The nodes from the root (inclusive) to the leaf named by `parts`.
    pub fn path_lookup<'a>(&'a self, parts: &[String]) -> Result<Vec<&'a SchemaNode>> {
        let mut nodes = vec![&self.root];
        let mut current = &self.root;
        for part in parts {
            current = current
                .children
                .iter()
                .find(|child| &child.element.name == part)
                .ok_or_else(|| {
                    Error::Schema(format!("element {part:?} not found in {:?}", parts.join(".")))
                })?;
            nodes.push(current);
        }
        Ok(nodes)
    }
}

fn build_tree(
    schema: &[SchemaElement],
    index: usize,
    path: &[String],
) -> Result<(SchemaNode, usize)> {
    let element = schema
        .get(index)
        .ok_or_else(|| Error::Schema("schema tree overruns the element list".to_string()))?
        .clone();

    let mut node_path = path.to_vec();
    if index != 0 {
        node_path.push(element.name.clone());
    }

    let mut count = 1;
    let mut children = Vec::with_capacity(element.num_children.unwrap_or(0));
    for _ in 0..element.num_children.unwrap_or(0) {
        let (child, consumed) = build_tree(schema, index + count, &node_path)?;
        count += consumed;
        children.push(child);
    }

    Ok((
        SchemaNode {
            element,
            path: node_path,
            children,
            count,
        },
        count,
    ))
}

/// Maximum repetition level of a path: the number of REPEATED elements along
/// it. The root does not count.
pub fn max_repetition_level(path: &[&SchemaNode]) -> u32 {
    path.iter()
        .skip(1)
        .filter(|node| node.element.repetition == Some(Repetition::Repeated))
        .count() as u32
}

/// Maximum definition level of a path: the number of non-REQUIRED elements
/// below the root.
pub fn max_definition_level(path: &[&SchemaNode]) -> u32 {
    path.iter()
        .skip(1)
        .filter(|node| node.element.repetition != Some(Repetition::Required))
        .count() as u32
}

/// A flat column: the path is root plus a childless, non-repeated leaf.
pub fn is_flat_column(path: &[&SchemaNode]) -> bool {
    path.len() == 2
        && path[1].element.repetition != Some(Repetition::Repeated)
        && path[1].children.is_empty()
}
