//! Recursive group to [Node] conversion
//!
//! Body lines are classified by shape, in this order:
//!
//! | shape                                   | result                               |
//! |-----------------------------------------|--------------------------------------|
//! | odd number of `"`                       | multi-line string, until quotes pair |
//! | ends with `{`                           | nested object (recursive)            |
//! | `{` alone                               | anonymous object, keyed `0`, `1`, .. |
//! | `{ key value }`                         | anonymous one-line object, same keys |
//! | `key {}`                                | empty object                         |
//! | `key { a b }` without quotes            | list                                 |
//! | `flag` or `"quoted text"`               | empty text                           |
//! | `key rest of line`                      | text                                 |
use super::{brace_delta, quote_count};
use crate::node::{Node, Object};
use crate::patterns::{EMPTY_OBJECT, MONITOR_MIN_OF, SCRIPT_TITLE, UNPARSED_TITLE};

/// Indentation of one nesting level
const INDENT: usize = 4;

const USER_DEFINED: &str = "user-defined";

/// Builds the node of one group
///
/// Returns the group's title (the declaration without its `{`) and the node. The verbatim body is kept in
/// [Object::body] of the returned object.
pub fn build_group(lines: &[String]) -> (String, Node) {
    let [first, .., last] = lines else {
        return match lines.first() {
            Some(line) => build_one_liner(line),
            None => (String::new(), Object::default().into()),
        };
    };

    let title = title_of(first);
    let inner = &lines[1..lines.len() - 1];
    let body = inner.join("\n");

    if last.trim() != "}" {
        tracing::debug!(%title, closer = %last, "group does not end with a lone closing brace");
    }

    if SCRIPT_TITLE.is_match(&title) {
        return (title, Node::Text(body));
    }

    if MONITOR_MIN_OF.is_match(&title) {
        return (title, Node::List(tokens(&body)));
    }

    if UNPARSED_TITLE.is_match(&title) {
        tracing::trace!(%title, "capturing body without parsing");
        return (title, Object::with_body(body).into());
    }

    let mut object = build_body(inner);
    object.body = Some(body);
    (title, object.into())
}

fn build_one_liner(line: &str) -> (String, Node) {
    let trimmed = line.trim();
    let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}')) else {
        return (title_of(trimmed), Object::with_body("").into());
    };

    let title = trimmed[..open].trim().to_string();
    if close < open {
        return (title, Object::with_body("").into());
    }

    let inner = trimmed[open + 1..close].trim();
    if SCRIPT_TITLE.is_match(&title) {
        return (title, Node::Text(inner.to_string()));
    }

    if MONITOR_MIN_OF.is_match(&title) {
        return (title, Node::List(tokens(inner)));
    }

    let mut object = Object::with_body(inner);
    if !inner.is_empty() && !UNPARSED_TITLE.is_match(&title) {
        parse_line(&mut object, inner);
    }

    (title, object.into())
}

fn build_body(lines: &[String]) -> Object {
    let mut object = Object::default();
    let mut anonymous = 0usize;
    let mut index = 0;

    while index < lines.len() {
        let line = &lines[index];
        let trimmed = line.trim();

        if trimmed.is_empty() {
            index += 1;
            continue;
        }

        if quote_count(trimmed) % 2 == 1 {
            let mut quotes = quote_count(trimmed);
            let mut end = index + 1;
            while quotes % 2 == 1 && end < lines.len() {
                quotes += quote_count(&lines[end]);
                end += 1;
            }

            if quotes % 2 == 1 {
                tracing::debug!(line = %trimmed, "quoted string not terminated before end of body");
            }

            let joined = lines[index..end].join("\n");
            insert_value(&mut object, joined.trim());
            index = end;
            continue;
        }

        if trimmed.ends_with('{') {
            let end = matching_close(lines, index);
            let nested: Vec<String> = lines[index..=end].iter().map(|l| dedent(l)).collect();
            let (title, node) = build_group(&nested);

            let key = if title.is_empty() {
                let key = anonymous.to_string();
                anonymous += 1;
                key
            } else {
                title
            };

            object.insert(key, node);
            index = end + 1;
            continue;
        }

        if trimmed.starts_with('{') && trimmed.ends_with('}') && brace_delta(trimmed) == 0 {
            let (_, node) = build_one_liner(trimmed);
            object.insert(anonymous.to_string(), node);
            anonymous += 1;
            index += 1;
            continue;
        }

        if indentation(line) != INDENT {
            tracing::debug!(%line, "unexpected indentation, ignoring line");
            index += 1;
            continue;
        }

        parse_line(&mut object, trimmed);
        index += 1;
    }

    object
}

/// Single line shapes that need no lookahead
fn parse_line(object: &mut Object, line: &str) {
    if let Some(captures) = EMPTY_OBJECT.captures(line) {
        object.insert(&captures[1], Object::with_body(""));
        return;
    }

    if line.contains('{') && line.contains('}') && !line.contains('"') {
        if let (Some(open), Some(close)) = (line.find('{'), line.rfind('}')) {
            if open < close {
                let key = line[..open].trim();
                object.insert(key, Node::List(tokens(&line[open + 1..close])));
                return;
            }
        }
    }

    if !line.contains(char::is_whitespace) || is_single_quoted(line) {
        object.insert(line, "");
        return;
    }

    insert_value(object, line);
}

/// Inserts `key value`, where value may span multiple lines
fn insert_value(object: &mut Object, text: &str) {
    let Some((key, rest)) = text.split_once(char::is_whitespace) else {
        object.insert(text, "");
        return;
    };
    let rest = rest.trim_start();

    if key != USER_DEFINED {
        object.insert(key, unquote(rest));
        return;
    }

    let (name, value) = rest
        .split_once(char::is_whitespace)
        .map(|(name, value)| (name, value.trim_start()))
        .unwrap_or((rest, ""));

    let entry = object
        .entries
        .entry(USER_DEFINED.to_string())
        .or_insert_with(|| Object::default().into());

    match entry {
        Node::Object(user_defined) => {
            user_defined.insert(name, unquote(value));
        }
        other => {
            let mut user_defined = Object::default();
            user_defined.insert(name, unquote(value));
            *other = user_defined.into();
        }
    }
}

/// Index of the line closing the object opened at `start`
fn matching_close(lines: &[String], start: usize) -> usize {
    let mut depth = brace_delta(&lines[start]);
    for (index, line) in lines.iter().enumerate().skip(start + 1) {
        depth += brace_delta(line);
        if depth <= 0 {
            return index;
        }
    }

    tracing::warn!(opener = %lines[start], "nested object not closed, using the rest of the body");
    lines.len() - 1
}

fn title_of(line: &str) -> String {
    line.trim().trim_end_matches('{').trim_end().to_string()
}

fn tokens(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn dedent(line: &str) -> String {
    line[indentation(line).min(INDENT)..].to_string()
}

fn is_single_quoted(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('"') && text.ends_with('"') && quote_count(text) == 2
}

fn unquote(text: &str) -> String {
    if is_single_quoted(text) {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn build(text: &str) -> (String, Node) {
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        build_group(&lines)
    }

    fn object(text: &str) -> Object {
        match build(text).1 {
            Node::Object(object) => object,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn pool_with_members() {
        let (title, node) = build(
            "ltm pool /Common/web_pool {
    load-balancing-mode round-robin
    members {
        /Common/10.0.0.1:80 {
            address 10.0.0.1
        }
    }
    monitor /Common/http
}",
        );
        assert_eq!(title, "ltm pool /Common/web_pool");

        let pool = node.as_object().expect("object");
        assert_eq!(pool.text("load-balancing-mode"), Some("round-robin"));
        assert_eq!(pool.text("monitor"), Some("/Common/http"));

        let member = pool
            .object("members")
            .and_then(|members| members.object("/Common/10.0.0.1:80"))
            .expect("member");
        assert_eq!(member.text("address"), Some("10.0.0.1"));
        assert_eq!(member.body.as_deref(), Some("    address 10.0.0.1"));
        assert!(pool.body.as_deref().unwrap_or_default().starts_with("    load-balancing-mode"));
    }

    #[test]
    fn pseudo_arrays_empty_objects_and_flags() {
        let vs = object(
            "ltm virtual /Common/vs {
    vlans {
        /Common/a
        /Common/b
    }
    vlans-enabled
    rules { /Common/r1 /Common/r2 }
    profiles {
        /Common/http { }
        /Common/tcp {}
    }
    \"quoted flag\"
}",
        );

        assert_eq!(
            vs.get("rules"),
            Some(&Node::List(vec!["/Common/r1".into(), "/Common/r2".into()]))
        );
        assert_eq!(vs.text("vlans-enabled"), Some(""));
        assert_eq!(vs.text("\"quoted flag\""), Some(""));

        let vlans = vs.object("vlans").expect("vlans");
        assert_eq!(Node::from(vlans.clone()).names(), vec!["/Common/a", "/Common/b"]);

        let profiles = vs.object("profiles").expect("profiles");
        assert_eq!(profiles.object("/Common/http"), Some(&Object::with_body("")));
        assert_eq!(profiles.object("/Common/tcp"), Some(&Object::with_body("")));
    }

    #[test]
    fn inline_pseudo_array() {
        let net = object("net vlan-group /Common/g {\n    members { /Common/a /Common/b }\n}");
        assert_eq!(
            net.get("members"),
            Some(&Node::List(vec!["/Common/a".into(), "/Common/b".into()]))
        );
    }

    #[test]
    fn anonymous_objects_get_indices() {
        let object = object(
            "apm policy customization-group /Common/g {
    items {
        {
            name first
        }
        {
            name second
        }
    }
}",
        );

        let items = object.object("items").expect("items");
        let keys: Vec<_> = items.entries.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["0", "1"]);
        assert_eq!(items.object("1").and_then(|o| o.text("name")), Some("second"));
    }

    #[test]
    fn inline_anonymous_objects_share_indices() {
        let object = object(
            "apm policy customization-group /Common/g {
    items {
        { name first }
        { name second }
        {
            name third
        }
    }
}",
        );

        let items = object.object("items").expect("items");
        let keys: Vec<_> = items.entries.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["0", "1", "2"]);
        assert_eq!(items.object("0").and_then(|o| o.text("name")), Some("first"));
        assert_eq!(items.object("1").and_then(|o| o.text("name")), Some("second"));
        assert_eq!(items.object("2").and_then(|o| o.text("name")), Some("third"));
    }

    #[test]
    fn multi_line_strings() {
        let object = object(
            "sys sshd {
    banner enabled
    banner-text \"Authorized use only
   all activity is logged\"
    description \"single line\"
}",
        );

        assert_eq!(
            object.text("banner-text"),
            Some("Authorized use only\n   all activity is logged")
        );
        assert_eq!(object.text("banner"), Some("enabled"));
        assert_eq!(object.text("description"), Some("single line"));
    }

    #[test]
    fn user_defined_monitor_values_nest() {
        let monitor = object(
            "ltm monitor external /Common/ext {
    run /Common/script
    user-defined HOST example.com
    user-defined BODY \"line one
line two\"
}",
        );

        let user_defined = monitor.object("user-defined").expect("user-defined");
        assert_eq!(user_defined.text("HOST"), Some("example.com"));
        assert_eq!(user_defined.text("BODY"), Some("line one\nline two"));
    }

    #[test]
    fn script_bodies_are_opaque() {
        let (title, node) = build("ltm rule /Common/redirect {\nwhen HTTP_REQUEST {\n  HTTP::redirect https://[HTTP::host][HTTP::uri]\n}\n}");
        assert_eq!(title, "ltm rule /Common/redirect");
        assert_eq!(
            node,
            Node::Text("when HTTP_REQUEST {\n  HTTP::redirect https://[HTTP::host][HTTP::uri]\n}".into())
        );
    }

    #[test]
    fn monitor_min_of_is_a_token_list() {
        let pool = object(
            "ltm pool /Common/p {
    monitor min 1 of {
        /Common/http
        /Common/https
    }
}",
        );

        assert_eq!(
            pool.get("monitor min 1 of"),
            Some(&Node::List(vec!["/Common/http".into(), "/Common/https".into()]))
        );
    }

    #[test]
    fn irregular_objects_keep_body_only() {
        let node = object("sys application apl-script /Common/s {\n    script \"a \"\" b\n}");
        assert!(node.is_empty());
        assert_eq!(node.body.as_deref(), Some("    script \"a \"\" b"));
    }

    #[test]
    fn one_liners() {
        let (title, node) = build("ltm node /Common/n1 { address 10.0.0.1 }");
        assert_eq!(title, "ltm node /Common/n1");
        assert_eq!(node.as_object().and_then(|n| n.text("address")), Some("10.0.0.1"));

        let (title, node) = build("sys folder / { }");
        assert_eq!(title, "sys folder /");
        assert_eq!(node, Node::Object(Object::with_body("")));
    }
}
