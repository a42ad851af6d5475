//! Hierarchical view of all parsed objects
//!
//! Objects are filed as `category -> subtype... -> qualified name`, so `ltm profile http /Common/http` lives at
//! `["ltm", "profile", "http"]` under the key `/Common/http`. Every qualified name is also recorded in a
//! [NameIndex] so lookups by name ("which monitor is `/Common/m`?") do not have to walk the tree.
use crate::node::{Node, Object};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigTree {
    root: Object,
    index: NameIndex,
}

/// A named object and where it was found
#[derive(Debug, PartialEq)]
pub struct Found<'a> {
    /// Category and subtypes, without the name
    pub path: &'a [String],
    pub node: &'a Node,
}

impl ConfigTree {
    pub fn root(&self) -> &Object {
        &self.root
    }

    pub fn index(&self) -> &NameIndex {
        &self.index
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut current = self.root.get(first.as_ref())?;
        for segment in rest {
            current = current.as_object()?.get(segment.as_ref())?;
        }
        Some(current)
    }

    pub fn get_object<S: AsRef<str>>(&self, path: &[S]) -> Option<&Object> {
        self.get(path).and_then(Node::as_object)
    }

    /// Value filed directly under `parent` as `name`
    pub fn lookup<S: AsRef<str>>(&self, parent: &[S], name: &str) -> Option<&Node> {
        self.get_object(parent)?.get(name)
    }

    /// Finds `name` at any depth below `prefix`
    ///
    /// A name may be filed under more than one path below `prefix` (e.g. two monitor types sharing a name).
    /// The lexicographically smallest path wins so the answer does not depend on source order.
    pub fn find_named<S: AsRef<str>>(&self, prefix: &[S], name: &str) -> Option<Found<'_>> {
        let mut found: Option<Found<'_>> = None;

        for path in self.index.paths(name) {
            if !has_prefix(path, prefix) {
                continue;
            }

            let Some(node) = self.lookup(path, name) else {
                continue;
            };

            if let Some(kept) = &found {
                tracing::debug!(name, kept = ?kept.path, ignored = ?path, "name filed under several paths");
                continue;
            }

            found = Some(Found { path, node });
        }

        found
    }

    /// Files `node` under `path` as `key`, without indexing it
    ///
    /// An existing object at the same place is merged with `node`.
    pub fn insert(&mut self, path: &[String], key: impl Into<String>, node: Node) {
        let parent = get_or_insert(&mut self.root, path);
        let key = key.into();

        match node {
            Node::Object(incoming) => match parent.get_mut(&key) {
                Some(Node::Object(existing)) => existing.merge(incoming),
                _ => {
                    parent.insert(key, incoming);
                }
            },
            node => {
                parent.insert(key, node);
            }
        }
    }

    /// Files `node` under `path` as `name` and records it in the [NameIndex]
    pub fn insert_named(&mut self, path: Vec<String>, name: impl Into<String>, node: Node) {
        let name = name.into();
        self.insert(&path, name.clone(), node);
        self.index.record(name, path);
    }

    /// Recursive union, `other` wins scalar conflicts
    pub fn merge(&mut self, other: ConfigTree) {
        self.root.merge(other.root);
        self.index.merge(other.index);
    }
}

impl serde::ser::Serialize for ConfigTree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.root.serialize(serializer)
    }
}

fn get_or_insert<'a>(object: &'a mut Object, path: &[String]) -> &'a mut Object {
    let Some((key, rest)) = path.split_first() else {
        return object;
    };

    let entry = object
        .entries
        .entry(key.clone())
        .or_insert_with(|| Object::default().into());

    if !matches!(entry, Node::Object(_)) {
        tracing::warn!(%key, "value is in the way of an object, replacing it");
        *entry = Object::default().into();
    }

    let Node::Object(child) = entry else {
        unreachable!("entry was replaced with an object above");
    };

    get_or_insert(child, rest)
}

fn has_prefix<S: AsRef<str>>(path: &[String], prefix: &[S]) -> bool {
    path.len() >= prefix.len()
        && path
            .iter()
            .zip(prefix)
            .all(|(segment, expected)| segment == expected.as_ref())
}

/// Qualified name to every `category subtype...` path it is filed under
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NameIndex {
    paths: BTreeMap<String, BTreeSet<Vec<String>>>,
}

impl NameIndex {
    pub fn record(&mut self, name: impl Into<String>, path: Vec<String>) {
        self.paths.entry(name.into()).or_default().insert(path);
    }

    pub fn paths(&self, name: &str) -> impl Iterator<Item = &Vec<String>> + '_ {
        self.paths.get(name).into_iter().flatten()
    }

    /// Every `(name, path)` pair, ordered by name then path
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Vec<String>)> + '_ {
        self.paths
            .iter()
            .flat_map(|(name, paths)| paths.iter().map(move |path| (name.as_str(), path)))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn merge(&mut self, other: NameIndex) {
        for (name, paths) in other.paths {
            self.paths.entry(name).or_default().extend(paths);
        }
    }
}

/// Reconstructs the declaration of an object filed under `path` as `name`
///
/// Multi-line bodies are wrapped as `title {\n<body>\n}`. Bodies that fit on one line and were not indented
/// (one-line objects) are written back as `title { <body> }`.
pub fn declaration<S: AsRef<str>>(path: &[S], name: &str, node: &Node) -> String {
    let mut title = path
        .iter()
        .map(|segment| segment.as_ref())
        .collect::<Vec<&str>>()
        .join(" ");
    if !name.is_empty() {
        title.push(' ');
        title.push_str(name);
    }

    let body = match node {
        Node::Text(text) => text.as_str(),
        Node::Object(object) => object.line().unwrap_or_default(),
        Node::List(list) => return format!("{title} {{ {} }}", list.join(" ")),
    };

    if body.trim().is_empty() {
        format!("{title} {{ }}")
    } else if !body.contains('\n') && !body.starts_with(char::is_whitespace) {
        format!("{title} {{ {body} }}")
    } else {
        format!("{title} {{\n{body}\n}}")
    }
}
