//! text to [ConfigTree]
//!
//! A source goes through four stages:
//! 1. [preprocess] normalizes line endings, folds legacy topology records and marks comments
//! 2. [group] finds the lines of every root object
//! 3. [build] turns each group into a [Node]
//! 4. [hierarchy] files every object under `category -> subtypes -> qualified name`
//!
//! Only grouping can fail. Everything after that either understands a line or logs and skips it.
mod build;
mod group;
mod hierarchy;
mod preprocess;

pub use build::build_group;
pub use group::{group_objects, ObjectGroup};
pub use hierarchy::hierarchize;
pub use preprocess::{preprocess, Preprocessed, COMMENT_MARK, TOPOLOGY_NAME};

use crate::sources::RawSource;
use crate::tree::ConfigTree;
use indexmap::IndexMap;

/// A preprocessed line and its 1-based number in the source text
#[derive(derive_new::new, Debug, Clone, PartialEq)]
pub struct Line {
    pub number: usize,
    pub text: String,
}

/// Result of parsing one source
#[derive(Debug)]
pub struct ParsedSource {
    pub version: Option<String>,
    pub object_count: usize,
    pub tree: ConfigTree,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("script body not terminated, declared at line {line}: {declaration}")]
    UnterminatedScript { line: usize, declaration: String },
    #[error("missing or extra '{{' or '}}' in object declared at line {line}: {text}")]
    Unbalanced { line: usize, text: String },
}

/// Parses one source into a fresh tree
///
/// Either the whole source parses or nothing is returned.
#[tracing::instrument(level = "debug", skip_all, fields(file = %source.file_name))]
pub fn parse_source(source: &RawSource) -> Result<ParsedSource, ParseError> {
    let preprocessed = preprocess(&source.content);
    let version = preprocessed.version.clone();
    let lines = preprocessed.into_content_lines();

    let groups = group_objects(&lines)?;
    tracing::debug!(groups = groups.len(), "grouped root objects");

    let mut objects: IndexMap<String, crate::node::Node> = IndexMap::new();
    for group in &groups {
        let (title, node) = build_group(&group.lines);
        if objects.insert(title.clone(), node).is_some() {
            tracing::debug!(%title, line = group.line, "object declared twice, keeping the last");
        }
    }

    Ok(ParsedSource {
        version,
        object_count: groups.len(),
        tree: hierarchize(objects),
    })
}

/// Change in brace depth caused by `line`
///
/// Braces inside double quotes and characters right after a `\` are not counted.
pub(crate) fn brace_delta(line: &str) -> i64 {
    let mut delta = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for c in line.chars() {
        if escaped {
            escaped = false;
            continue;
        }

        match c {
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            '{' if !in_quotes => delta += 1,
            '}' if !in_quotes => delta -= 1,
            _ => {}
        }
    }

    delta
}

/// Number of `"` in `line` that are not preceded by a `\`
pub(crate) fn quote_count(line: &str) -> usize {
    let mut count = 0;
    let mut escaped = false;

    for c in line.chars() {
        if escaped {
            escaped = false;
            continue;
        }

        match c {
            '\\' => escaped = true,
            '"' => count += 1,
            _ => {}
        }
    }

    count
}
