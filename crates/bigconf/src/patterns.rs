//! Line shapes of the tmsh dialect
use regex::Regex;
use std::sync::LazyLock;

/// `#TMSH-VERSION: 15.1.0` or `#TMSH-VERSION: 15.1.8.2`
pub static TMSH_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#TMSH-VERSION:\s*(\d+\.\d+\.\d+(?:\.\d+)?)").unwrap());

/// Root opener of an object whose body is an embedded script
pub static SCRIPT_OPENER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:ltm rule|gtm rule|pem irule) \S+ \{\s*$").unwrap());

/// Script lines that are not counted for brace depth
pub static SCRIPT_SKIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:#|set\s|STREAM::expression)").unwrap());

/// Objects with irregular quoting: body is captured, entries stay empty
pub static UNPARSED_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:sys application apl-script|sys crypto cert-order-manager) ").unwrap()
});

/// Objects whose body is kept as plain text
pub static SCRIPT_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:ltm rule|gtm rule|pem irule) ").unwrap());

pub static MONITOR_MIN_OF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"monitor min \d+ of").unwrap());

/// `key {}` or `key { }`
pub static EMPTY_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S.*?)\s*\{\s*\}$").unwrap());

/// Legacy single record topology object
pub static TOPOLOGY_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gtm topology ldns: (?P<ldns>.+?) server: (?P<server>.+?) \{\s*(?P<closed>\})?\s*$")
        .unwrap()
});

pub static TOPOLOGY_LONGEST_MATCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s+topology-longest-match\s+(\S+)").unwrap());

/// Pool references inside policy actions (`forward select pool /Common/web_pool`)
pub static POLICY_POOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpool\s+(/[^\s{}]+)").unwrap());
