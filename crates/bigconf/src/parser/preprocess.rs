//! Line normalization ahead of grouping
use super::{brace_delta, quote_count, Line};
use crate::patterns::{
    SCRIPT_OPENER, SCRIPT_SKIP, TMSH_VERSION, TOPOLOGY_LONGEST_MATCH, TOPOLOGY_RECORD,
};

/// Replaces comment lines so they never reach the grouper
pub const COMMENT_MARK: &str = "\u{0}#comment#";

/// Qualified name of the object that collects legacy topology records
pub const TOPOLOGY_NAME: &str = "/Common/Shared/topology";

#[derive(Debug)]
pub struct Preprocessed {
    /// Version from the `#TMSH-VERSION:` header, if any
    pub version: Option<String>,
    pub lines: Vec<Line>,
}

impl Preprocessed {
    /// Lines without the comment markers
    pub fn into_content_lines(self) -> Vec<Line> {
        self.lines
            .into_iter()
            .filter(|line| line.text != COMMENT_MARK)
            .collect()
    }
}

pub fn preprocess(text: &str) -> Preprocessed {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let version = TMSH_VERSION
        .captures(&normalized)
        .map(|captures| captures[1].to_string());

    let longest_match = TOPOLOGY_LONGEST_MATCH
        .captures(&normalized)
        .map(|captures| matches!(&captures[1], "yes" | "true" | "enabled"))
        .unwrap_or(true);

    let lines = normalized
        .split('\n')
        .enumerate()
        .map(|(index, text)| Line::new(index + 1, text.to_string()))
        .collect();

    let lines = rewrite_topology(lines, longest_match);
    let lines = mark_comments(lines);

    Preprocessed { version, lines }
}

/// Folds legacy `gtm topology ldns: ... server: ... { }` objects into a single `records` object
///
/// The combined object is placed where the first legacy record was found. A record without a closing `}` before
/// the next root line is left as it is.
fn rewrite_topology(lines: Vec<Line>, longest_match: bool) -> Vec<Line> {
    let mut out = Vec::with_capacity(lines.len());
    let mut records: Vec<(String, String, Vec<String>)> = vec![];
    let mut insert_at = None;

    let mut index = 0;
    while index < lines.len() {
        let line = &lines[index];
        let Some(captures) = TOPOLOGY_RECORD.captures(&line.text) else {
            out.push(line.clone());
            index += 1;
            continue;
        };

        let end = match captures.name("closed") {
            Some(_) => Some(index),
            None => record_end(&lines, index),
        };
        let Some(end) = end else {
            tracing::warn!(line = line.number, text = %line.text, "legacy topology record not closed, leaving it unchanged");
            out.push(line.clone());
            index += 1;
            continue;
        };

        if insert_at.is_none() {
            insert_at = Some((out.len(), line.number));
        }

        records.push((
            captures["ldns"].trim().to_string(),
            captures["server"].trim().to_string(),
            lines[index + 1..end]
                .iter()
                .map(|inner| inner.text.trim().to_string())
                .collect(),
        ));
        index = end + 1;
    }

    let Some((index, number)) = insert_at else {
        return out;
    };

    tracing::debug!(records = records.len(), "rewrote legacy topology records");

    let mut block = vec![format!("gtm topology {TOPOLOGY_NAME} {{"), "    records {".to_string()];
    for (record_index, (ldns, server, body)) in records.into_iter().enumerate() {
        block.push(format!("        {record_index} {{"));
        block.push(format!("            source {ldns}"));
        block.push(format!("            destination {server}"));
        for body_line in body.into_iter().filter(|line| !line.is_empty()) {
            block.push(format!("            {body_line}"));
        }
        block.push("        }".to_string());
    }
    block.push("    }".to_string());
    block.push(format!("    longest-match-enabled {longest_match}"));
    block.push("}".to_string());

    out.splice(
        index..index,
        block.into_iter().map(|text| Line::new(number, text)),
    );
    out
}

/// Index of the root level `}` closing the record opened at `start`
fn record_end(lines: &[Line], start: usize) -> Option<usize> {
    for (index, line) in lines.iter().enumerate().skip(start + 1) {
        if line.text.is_empty() || line.text.starts_with(char::is_whitespace) {
            continue;
        }

        return (line.text.trim_end() == "}").then_some(index);
    }

    None
}

/// Replaces comment lines outside of script bodies and quoted strings with [COMMENT_MARK]
///
/// Script bodies are kept verbatim, including their comments. Their extent is tracked with the same rules the
/// grouper uses: brace counting, and a new script opener ends the previous script. Lines continuing a multi-line
/// quoted value are never comments.
fn mark_comments(mut lines: Vec<Line>) -> Vec<Line> {
    let mut script_depth: i64 = 0;
    let mut open_quote = false;

    for line in lines.iter_mut() {
        if SCRIPT_OPENER.is_match(&line.text) {
            script_depth = 1;
            open_quote = false;
            continue;
        }

        if script_depth > 0 {
            if !SCRIPT_SKIP.is_match(&line.text) {
                script_depth += brace_delta(&line.text);
            }
            continue;
        }

        let odd_quotes = quote_count(&line.text) % 2 == 1;

        if open_quote {
            open_quote = !odd_quotes;
            continue;
        }

        if line.text.trim_start().starts_with('#') {
            line.text = COMMENT_MARK.to_string();
            continue;
        }

        open_quote = odd_quotes;
    }

    lines
}
