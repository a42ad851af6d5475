//! parsed value representation
//!
//! Every value found in a configuration body is one of
//! - text (script bodies, scalar properties, bare flags as `""`)
//! - list (single line `{ a b c }` pseudo-arrays, `monitor min N of` token lists)
//! - object (order-preserving map from string key to value)
//!
//! Objects also remember the verbatim text of their body. The hierarchizer moves that text into the
//! reserved [LINE] entry so it survives serialization.
use indexmap::IndexMap;
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

/// Reserved entry holding the verbatim body of an object
pub const LINE: &str = "line";

/// All possible value types
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    List(Vec<String>),
    Object(Object),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    pub entries: IndexMap<String, Node>,

    /// Verbatim body text captured by the tree builder
    ///
    /// Not serialized. See [Object::take_body].
    pub body: Option<String>,
}

impl Object {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            entries: Default::default(),
            body: Some(body.into()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Node>) -> Option<Node> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Node::as_text)
    }

    pub fn object(&self, key: &str) -> Option<&Object> {
        self.get(key).and_then(Node::as_object)
    }

    /// The reconstructed body, either from the [LINE] entry or the not yet moved capture
    pub fn line(&self) -> Option<&str> {
        self.text(LINE).or(self.body.as_deref())
    }

    pub fn take_body(&mut self) -> Option<String> {
        self.body.take()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.entries.iter()
    }

    /// Recursive union with `other`
    ///
    /// Objects on both sides are merged key by key. Any other pairing is a conflict and `other` wins.
    pub fn merge(&mut self, other: Object) {
        if other.body.is_some() {
            self.body = other.body;
        }

        for (key, value) in other.entries {
            match value {
                Node::Object(incoming) => match self.entries.get_mut(&key) {
                    Some(Node::Object(existing)) => existing.merge(incoming),
                    _ => {
                        self.entries.insert(key, Node::Object(incoming));
                    }
                },
                value => {
                    self.entries.insert(key, value);
                }
            }
        }
    }
}

impl Node {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Node::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Node::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Node::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Names referenced by this value
    ///
    /// The dialect writes references in three shapes depending on how many there are and whether they carry
    /// settings: `rules { /a /b }` (list), `profiles { /a { } /b { context all } }` (object keys) or plain
    /// `pool /a` (text).
    pub fn names(&self) -> Vec<String> {
        match self {
            Node::Text(text) => text.split_whitespace().map(str::to_string).collect(),
            Node::List(list) => list.clone(),
            Node::Object(object) => object
                .entries
                .keys()
                .filter(|key| key.as_str() != LINE)
                .cloned()
                .collect(),
        }
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Text(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Text(value.to_string())
    }
}

impl From<Vec<String>> for Node {
    fn from(value: Vec<String>) -> Self {
        Node::List(value)
    }
}

impl From<Object> for Node {
    fn from(value: Object) -> Self {
        Node::Object(value)
    }
}

impl serde::ser::Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Node::Text(value) => serializer.serialize_str(value),
            Node::List(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Node::Object(value) => value.serialize(serializer),
        }
    }
}

impl serde::ser::Serialize for Object {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut ser = serializer.serialize_map(Some(self.entries.len()))?;
        for (element_key, element_value) in &self.entries {
            ser.serialize_entry(element_key, element_value)?;
        }
        ser.end()
    }
}
