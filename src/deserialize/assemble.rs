//! Dremel record assembly: from flat `(values, definition levels, repetition
//! levels)` triples back into nested lists, and from assembled leaf columns
//! into lists, maps and structs.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::schema::types::Repetition;
use crate::schema::SchemaNode;
use crate::value::Value;

/// Reconstructs one page's worth of nested lists from its levels, appending
/// whole or partial rows to `output`.
///
/// `rep_path` holds the repetition of every element on the column's path,
/// root first; the root counts as `Required`. A leading non-zero repetition
/// level continues the last (still open) row of `output`.
pub fn assemble_lists(
    output: &mut Vec<Value>,
    def_levels: Option<&[u32]>,
    rep_levels: &[u32],
    values: Vec<Value>,
    rep_path: &[Repetition],
) {
    let n = def_levels.map(|levels| levels.len()).unwrap_or(rep_levels.len());
    if n == 0 {
        output.extend(values);
        return;
    }
    let max_def = rep_path
        .iter()
        .skip(1)
        .filter(|repetition| **repetition != Repetition::Required)
        .count() as u32;

    // open containers: stack[0] is the output, the last entry is the one
    // being filled. Containers are committed to their parent when closed.
    let mut stack: Vec<Vec<Value>> = vec![std::mem::take(output)];
    let mut depth = 0usize; // schema depth, index into rep_path
    let mut def = 0u32; // list depth
    let mut rep = 0u32;

    // a leading repetition level continues the previous row: re-open the
    // last committed container at each level
    if rep_levels.first().copied().unwrap_or(0) > 0 {
        while depth < rep_path.len().saturating_sub(2) && rep < rep_levels[0] {
            depth += 1;
            if rep_path[depth] != Repetition::Required {
                def += 1;
            }
            if rep_path[depth] == Repetition::Repeated {
                rep += 1;
            }
            if rep_path[depth] != Repetition::Required {
                let parent = stack.last_mut().unwrap();
                match parent.pop() {
                    Some(Value::List(open)) => stack.push(open),
                    Some(other) => {
                        parent.push(other);
                        stack.push(Vec::new());
                    }
                    None => stack.push(Vec::new()),
                }
            }
        }
    }

    let mut values = values.into_iter();
    for i in 0..n {
        let d = def_levels.map(|levels| levels[i]).unwrap_or(max_def);
        let r = rep_levels.get(i).copied().unwrap_or(0);

        // pop back to the container of this repetition level
        while depth > 0 && (r < rep || rep_path[depth] != Repetition::Repeated) {
            if rep_path[depth] != Repetition::Required {
                let closed = stack.pop().unwrap();
                stack.last_mut().unwrap().push(Value::List(closed));
                def -= 1;
            }
            if rep_path[depth] == Repetition::Repeated {
                rep -= 1;
            }
            depth -= 1;
        }

        // descend to the definition level
        while (depth < rep_path.len().saturating_sub(2)
            || rep_path.get(depth + 1) == Some(&Repetition::Repeated))
            && (def < d || rep_path.get(depth + 1) == Some(&Repetition::Required))
        {
            depth += 1;
            if rep_path[depth] != Repetition::Required {
                stack.push(Vec::new());
                def += 1;
            }
            if rep_path[depth] == Repetition::Repeated {
                rep += 1;
            }
        }

        // emit a value, a null, or a closed empty list
        let container = stack.last_mut().unwrap();
        if d == max_def {
            container.push(values.next().unwrap_or(Value::Null));
        } else if depth == rep_path.len().saturating_sub(2) {
            container.push(Value::Null);
        } else {
            container.push(Value::List(Vec::new()));
        }
    }

    // close all containers; a following page may re-open them
    while stack.len() > 1 {
        let closed = stack.pop().unwrap();
        stack.last_mut().unwrap().push(Value::List(closed));
    }
    *output = stack.pop().unwrap();
}

/// Combines assembled leaf columns under `node` into a single column of
/// nested lists, maps and structs, keyed by `node`'s dotted path.
///
/// `depth` is the list-nesting depth of `node` within the assembled values.
pub fn assemble_nested(
    data: &mut HashMap<String, Vec<Value>>,
    node: &SchemaNode,
    depth: usize,
) -> Result<()> {
    let key = node.dotted_path();
    let optional = node.element.repetition == Some(Repetition::Optional);
    let next_depth = depth + usize::from(optional);

    if node.is_list_like() {
        let repeated = &node.children[0];
        let (sublist, sub_depth) = if repeated.children.len() == 1 {
            (&repeated.children[0], next_depth + 1)
        } else {
            (repeated, next_depth)
        };
        assemble_nested(data, sublist, sub_depth)?;

        let mut values = data.remove(&sublist.dotted_path()).ok_or_else(|| {
            Error::Schema(format!("list column {key:?} is missing its values"))
        })?;
        if optional {
            flatten_at_depth(&mut values, depth);
        }
        data.insert(key, values);
        return Ok(());
    }

    if node.is_map_like() {
        let key_value = &node.children[0];
        assemble_nested(data, &key_value.children[0], next_depth + 1)?;
        assemble_nested(data, &key_value.children[1], next_depth + 1)?;

        let keys = data
            .remove(&key_value.children[0].dotted_path())
            .ok_or_else(|| Error::Schema(format!("map column {key:?} is missing its keys")))?;
        let values = data
            .remove(&key_value.children[1].dotted_path())
            .ok_or_else(|| Error::Schema(format!("map column {key:?} is missing its values")))?;
        if keys.len() != values.len() {
            return Err(Error::Schema(format!(
                "map column {key:?} has {} keys and {} values",
                keys.len(),
                values.len()
            )));
        }
        let mut maps = assemble_maps(keys, values, next_depth)?;
        if optional {
            flatten_at_depth(&mut maps, depth);
        }
        data.insert(key, maps);
        return Ok(());
    }

    if !node.children.is_empty() {
        // a struct: transpose the fields into records
        let invert_depth = if node.element.repetition == Some(Repetition::Required)
            || node.element.repetition.is_none()
        {
            depth
        } else {
            depth + 1
        };
        let mut fields = Vec::with_capacity(node.children.len());
        for child in &node.children {
            assemble_nested(data, child, invert_depth)?;
            let values = data.remove(&child.dotted_path()).ok_or_else(|| {
                Error::Schema(format!(
                    "struct column {key:?} is missing field {:?}",
                    child.element.name
                ))
            })?;
            fields.push((child.element.name.clone(), values));
        }
        let mut inverted = invert_struct(fields, invert_depth)?;
        if optional {
            flatten_at_depth(&mut inverted, depth);
        }
        data.insert(key, inverted);
    }
    // a leaf: its data is already keyed by its path
    Ok(())
}

/// Descends `depth` layers of lists and replaces each innermost list with its
/// first element; an empty or missing list becomes null.
fn flatten_at_depth(values: &mut Vec<Value>, depth: usize) {
    for value in values.iter_mut() {
        if depth > 0 {
            if let Value::List(inner) = value {
                flatten_at_depth(inner, depth - 1);
            }
        } else {
            let taken = std::mem::replace(value, Value::Null);
            *value = match taken {
                Value::List(inner) => inner.into_iter().next().unwrap_or(Value::Null),
                other => other,
            };
        }
    }
}

/// Pairs key and value lists into records at `depth`. A null key list yields
/// a null map.
fn assemble_maps(keys: Vec<Value>, values: Vec<Value>, depth: usize) -> Result<Vec<Value>> {
    keys.into_iter()
        .zip(values)
        .map(|(key, value)| match (key, value) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::List(keys), Value::List(values)) => {
                if depth > 0 {
                    Ok(Value::List(assemble_maps(keys, values, depth - 1)?))
                } else {
                    if keys.len() != values.len() {
                        return Err(Error::Schema(
                            "map entry key/value length mismatch".to_string(),
                        ));
                    }
                    Ok(Value::Record(
                        keys.into_iter()
                            .zip(values)
                            .map(|(key, value)| (key.into_map_key(), value))
                            .collect(),
                    ))
                }
            }
            _ => Err(Error::Schema("malformed map column".to_string())),
        })
        .collect()
}

/// Transposes a field-of-arrays into an array-of-records at `depth`.
fn invert_struct(fields: Vec<(String, Vec<Value>)>, depth: usize) -> Result<Vec<Value>> {
    let length = fields
        .first()
        .map(|(_, values)| values.len())
        .unwrap_or(0);
    if let Some((name, values)) = fields.iter().find(|(_, values)| values.len() != length) {
        return Err(Error::Schema(format!(
            "struct field {name:?} has {} rows, expected {length}",
            values.len()
        )));
    }

    if depth == 0 {
        let mut rows: Vec<Vec<(String, Value)>> = (0..length)
            .map(|_| Vec::with_capacity(fields.len()))
            .collect();
        for (name, values) in fields {
            for (row, value) in rows.iter_mut().zip(values) {
                row.push((name.clone(), value));
            }
        }
        return Ok(rows.into_iter().map(Value::Record).collect());
    }

    // descend one list level per field and recurse
    let mut columns: Vec<(String, Vec<Vec<Value>>)> = Vec::with_capacity(fields.len());
    for (name, values) in fields {
        let lists = values
            .into_iter()
            .map(|value| match value {
                Value::List(inner) => Ok(Some(inner)),
                Value::Null => Ok(None),
                _ => Err(Error::Schema(format!(
                    "struct field {name:?} is not nested deep enough"
                ))),
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .map(|inner| inner.unwrap_or_default())
            .collect::<Vec<_>>();
        columns.push((name, lists));
    }
    (0..length)
        .map(|i| {
            let inner_fields = columns
                .iter_mut()
                .map(|(name, lists)| (name.clone(), std::mem::take(&mut lists[i])))
                .collect::<Vec<_>>();
            Ok(Value::List(invert_struct(inner_fields, depth - 1)?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ConvertedType, PhysicalType, SchemaElement};
    use crate::schema::SchemaTree;

    use Repetition::*;

    fn list(values: Vec<Value>) -> Value {
        Value::List(values)
    }

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int64).collect()
    }

    #[test]
    fn flat_optional_expands_nulls() {
        let mut output = vec![];
        assemble_lists(
            &mut output,
            Some(&[1, 0, 1]),
            &[],
            ints(&[7, 8]),
            &[Required, Optional],
        );
        assert_eq!(
            output,
            vec![Value::Int64(7), Value::Null, Value::Int64(8)]
        );
    }

    #[test]
    fn three_level_list() {
        // rows: [1, 2], null, [], [3]
        let rep_path = &[Required, Optional, Repeated, Optional];
        let mut output = vec![];
        assemble_lists(
            &mut output,
            Some(&[3, 3, 0, 1, 3]),
            &[0, 1, 0, 0, 0],
            ints(&[1, 2, 3]),
            rep_path,
        );
        assert_eq!(
            output,
            vec![
                list(vec![list(ints(&[1, 2]))]),
                list(vec![]),
                list(vec![list(vec![])]),
                list(vec![list(ints(&[3]))]),
            ]
        );
        // the optional level flattens away at the top
        flatten_at_depth(&mut output, 0);
        assert_eq!(
            output,
            vec![
                list(ints(&[1, 2])),
                Value::Null,
                list(vec![]),
                list(ints(&[3])),
            ]
        );
    }

    #[test]
    fn null_inside_list() {
        let rep_path = &[Required, Optional, Repeated, Optional];
        let mut output = vec![];
        // row: [1, null, 2]
        assemble_lists(
            &mut output,
            Some(&[3, 2, 3]),
            &[0, 1, 1],
            ints(&[1, 2]),
            rep_path,
        );
        flatten_at_depth(&mut output, 0);
        assert_eq!(
            output,
            vec![list(vec![Value::Int64(1), Value::Null, Value::Int64(2)])]
        );
    }

    #[test]
    fn page_continuation_extends_open_row() {
        let rep_path = &[Required, Optional, Repeated, Optional];
        let mut output = vec![];
        assemble_lists(
            &mut output,
            Some(&[3, 3]),
            &[0, 1],
            ints(&[1, 2]),
            rep_path,
        );
        // second page starts mid-row
        assemble_lists(
            &mut output,
            Some(&[3, 3]),
            &[1, 0],
            ints(&[3, 4]),
            rep_path,
        );
        flatten_at_depth(&mut output, 0);
        assert_eq!(
            output,
            vec![list(ints(&[1, 2, 3])), list(ints(&[4]))]
        );
    }

    #[test]
    fn repeated_leaf() {
        // legacy: repeated int64 directly under the root
        let rep_path = &[Required, Repeated];
        let mut output = vec![];
        assemble_lists(
            &mut output,
            Some(&[1, 1, 1]),
            &[0, 1, 0],
            ints(&[1, 2, 3]),
            rep_path,
        );
        assert_eq!(output, vec![list(ints(&[1, 2])), list(ints(&[3]))]);
    }

    #[test]
    fn round_trip_known_structure() {
        // the canonical two-row example: [[1,2],[3]] and [[4]]
        let rep_path = &[Required, Optional, Repeated, Optional, Repeated, Optional];
        // depth: l(opt) . list(rep) . inner(opt) . list(rep) . element(opt)
        let mut output = vec![];
        assemble_lists(
            &mut output,
            Some(&[5, 5, 5, 5]),
            &[0, 2, 1, 0],
            ints(&[1, 2, 3, 4]),
            rep_path,
        );
        flatten_at_depth(&mut output, 0);
        // each inner list is itself wrapped by its optional level
        assert_eq!(
            output,
            vec![
                list(vec![
                    list(vec![list(ints(&[1, 2]))]),
                    list(vec![list(ints(&[3]))]),
                ]),
                list(vec![list(vec![list(ints(&[4]))])]),
            ]
        );
    }

    fn leaf_element(name: &str, repetition: Repetition) -> SchemaElement {
        SchemaElement {
            name: name.to_string(),
            physical_type: Some(PhysicalType::Int64),
            type_length: None,
            repetition: Some(repetition),
            num_children: None,
            converted_type: None,
            scale: None,
            precision: None,
            logical_type: None,
        }
    }

    fn group_element(
        name: &str,
        repetition: Option<Repetition>,
        num_children: usize,
        converted_type: Option<ConvertedType>,
    ) -> SchemaElement {
        SchemaElement {
            name: name.to_string(),
            physical_type: None,
            type_length: None,
            repetition,
            num_children: Some(num_children),
            converted_type,
            scale: None,
            precision: None,
            logical_type: None,
        }
    }

    #[test]
    fn nested_list_column() {
        let schema = vec![
            group_element("schema", None, 1, None),
            group_element("l", Some(Optional), 1, Some(ConvertedType::List)),
            group_element("list", Some(Repeated), 1, None),
            leaf_element("element", Optional),
        ];
        let tree = SchemaTree::try_new(&schema).unwrap();

        // rows: [1, 2] and null
        let mut data = HashMap::new();
        data.insert(
            "l.list.element".to_string(),
            vec![list(vec![list(ints(&[1, 2]))]), list(vec![])],
        );
        assemble_nested(&mut data, &tree.root.children[0], 0).unwrap();
        assert_eq!(
            data.remove("l").unwrap(),
            vec![list(ints(&[1, 2])), Value::Null]
        );
    }

    #[test]
    fn nested_map_column() {
        let schema = vec![
            group_element("schema", None, 1, None),
            group_element("m", Some(Optional), 1, Some(ConvertedType::Map)),
            group_element("key_value", Some(Repeated), 2, None),
            leaf_element("key", Required),
            leaf_element("value", Optional),
        ];
        let tree = SchemaTree::try_new(&schema).unwrap();

        // rows: {"a": 1, "b": 2}, {}, null
        let keys = vec![
            list(vec![list(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string()),
            ])]),
            list(vec![list(vec![])]),
            list(vec![]),
        ];
        let values = vec![
            list(vec![list(ints(&[1, 2]))]),
            list(vec![list(vec![])]),
            list(vec![]),
        ];
        let mut data = HashMap::new();
        data.insert("m.key_value.key".to_string(), keys);
        data.insert("m.key_value.value".to_string(), values);
        assemble_nested(&mut data, &tree.root.children[0], 0).unwrap();
        assert_eq!(
            data.remove("m").unwrap(),
            vec![
                Value::Record(vec![
                    ("a".to_string(), Value::Int64(1)),
                    ("b".to_string(), Value::Int64(2)),
                ]),
                Value::Record(vec![]),
                Value::Null,
            ]
        );
    }

    #[test]
    fn nested_struct_column() {
        let schema = vec![
            group_element("schema", None, 1, None),
            group_element("s", Some(Optional), 2, None),
            leaf_element("a", Optional),
            leaf_element("b", Optional),
        ];
        let tree = SchemaTree::try_new(&schema).unwrap();

        // rows: {a: 1, b: 2}, null struct, {a: null, b: 3}
        let rep_path = &[Required, Optional, Optional];
        let mut a = vec![];
        assemble_lists(&mut a, Some(&[2, 0, 1]), &[], ints(&[1]), rep_path);
        let mut b = vec![];
        assemble_lists(&mut b, Some(&[2, 0, 2]), &[], ints(&[2, 3]), rep_path);

        let mut data = HashMap::new();
        data.insert("s.a".to_string(), a);
        data.insert("s.b".to_string(), b);
        assemble_nested(&mut data, &tree.root.children[0], 0).unwrap();
        assert_eq!(
            data.remove("s").unwrap(),
            vec![
                Value::Record(vec![
                    ("a".to_string(), Value::Int64(1)),
                    ("b".to_string(), Value::Int64(2)),
                ]),
                Value::Null,
                Value::Record(vec![
                    ("a".to_string(), Value::Null),
                    ("b".to_string(), Value::Int64(3)),
                ]),
            ]
        );
    }
}
