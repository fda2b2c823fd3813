use crate::value::{Fields, Node};

/// Delimiter joining nested keys in output column names.
pub const KEY_DELIMITER: &str = "__";

/// A single-level record: no value is a [`Node::Map`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    fields: Fields,
}

impl FlatRecord {
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn as_fields(&self) -> &Fields {
        &self.fields
    }
}

/// Flattens a nested response so it fits a single table row.
///
/// Nested maps are walked recursively and their keys prefixed with
/// `parent + delimiter`; every other value is copied as is. When two paths
/// join to the same key, the one visited last wins.
///
/// # Example
///
/// `{"a": {"b": 1}, "d": 3}` becomes `{"a__b": 1, "d": 3}` with `"__"`.
pub fn flatten(fields: &Fields, delimiter: &str) -> FlatRecord {
    let mut flat = Fields::new();
    flatten_into(&mut flat, None, fields, delimiter);
    FlatRecord { fields: flat }
}

fn flatten_into(out: &mut Fields, prefix: Option<&str>, fields: &Fields, delimiter: &str) {
    for (key, value) in fields.iter() {
        let path = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, delimiter, key),
            None => key.to_string(),
        };
        match value {
            Node::Map(inner) => flatten_into(out, Some(&path), inner, delimiter),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}
