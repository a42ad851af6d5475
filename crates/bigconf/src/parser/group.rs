use super::{brace_delta, Line, ParseError};
use crate::patterns::{SCRIPT_OPENER, SCRIPT_SKIP};

/// All lines of one root object, opener to matching closer
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectGroup {
    /// Line number of the opener
    pub line: usize,
    pub lines: Vec<String>,
}

/// Splits comment free lines into root object groups
pub fn group_objects(lines: &[Line]) -> Result<Vec<ObjectGroup>, ParseError> {
    let mut groups = vec![];
    let mut index = 0;

    while index < lines.len() {
        let opener = &lines[index];

        if is_root_one_liner(&opener.text) {
            groups.push(ObjectGroup {
                line: opener.number,
                lines: vec![opener.text.clone()],
            });
            index += 1;
            continue;
        }

        if !is_root_opener(&opener.text) {
            if !opener.text.trim().is_empty() {
                tracing::trace!(line = opener.number, text = %opener.text, "skipping line outside of any object");
            }
            index += 1;
            continue;
        }

        let is_script = SCRIPT_OPENER.is_match(&opener.text);
        let mut depth: i64 = 1;
        let mut end = index + 1;

        while depth > 0 {
            let Some(line) = lines.get(end) else {
                return Err(if is_script {
                    ParseError::UnterminatedScript {
                        line: opener.number,
                        declaration: opener.text.clone(),
                    }
                } else {
                    ParseError::Unbalanced {
                        line: opener.number,
                        text: opener.text.clone(),
                    }
                });
            };

            if is_script {
                if SCRIPT_OPENER.is_match(&line.text) {
                    tracing::warn!(
                        line = opener.number,
                        declaration = %opener.text,
                        next = line.number,
                        "script body not closed before the next script, ending it early"
                    );
                    break;
                }

                if SCRIPT_SKIP.is_match(&line.text) {
                    end += 1;
                    continue;
                }
            }

            depth += brace_delta(&line.text);
            end += 1;
        }

        groups.push(ObjectGroup {
            line: opener.number,
            lines: lines[index..end].iter().map(|line| line.text.clone()).collect(),
        });
        index = end;
    }

    Ok(groups)
}

fn is_root_opener(text: &str) -> bool {
    !text.starts_with(char::is_whitespace) && text.trim_end().ends_with('{')
}

fn is_root_one_liner(text: &str) -> bool {
    !text.starts_with(char::is_whitespace)
        && text.contains('{')
        && text.trim_end().ends_with('}')
        && brace_delta(text) == 0
}
