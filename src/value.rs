//! Generic response tree.
//!
//! Finstat answers in XML whose shape depends on the request type, so the
//! response is kept as an untyped tree instead of a fixed struct.

use indexmap::map::Entry;
use indexmap::IndexMap;

/// One node of a decoded response.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Text(String),
    Number(f64),
    Map(Fields),
    List(Vec<Node>),
}

impl Node {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            Node::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// Renders the node as a single CSV cell.
    ///
    /// Nulls become an empty cell and lists (or maps, which never reach a
    /// flat record) are written as compact JSON.
    pub fn to_cell(&self) -> String {
        match self {
            Node::Null => String::new(),
            Node::Text(s) => s.clone(),
            Node::Number(n) => n.to_string(),
            Node::Map(_) | Node::List(_) => self.to_json().to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Node::Null => serde_json::Value::Null,
            Node::Text(s) => serde_json::Value::String(s.clone()),
            Node::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Node::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Node::List(items) => {
                serde_json::Value::Array(items.iter().map(Node::to_json).collect())
            }
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Node::Number(n)
    }
}

impl From<Fields> for Node {
    fn from(fields: Fields) -> Self {
        Node::Map(fields)
    }
}

/// Insertion-ordered map of string keys to nodes.
///
/// Re-inserting an existing key overwrites the value but keeps the key at
/// its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: IndexMap<String, Node>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: Node) -> Option<Node> {
        self.entries.insert(key.into(), value)
    }

    /// Adds a child under `key`; a second child with the same key turns the
    /// entry into a list.
    pub fn push_child(&mut self, key: impl Into<String>, value: Node) {
        match self.entries.entry(key.into()) {
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Node::List(items) => items.push(value),
                existing => {
                    let first = std::mem::replace(existing, Node::Null);
                    *existing = Node::List(vec![first, value]);
                }
            },
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Removes and returns the value under `key`, keeping the order of the
    /// remaining entries.
    pub fn shift_remove(&mut self, key: &str) -> Option<Node> {
        self.entries.shift_remove(key)
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, Node);
    type IntoIter = indexmap::map::IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
