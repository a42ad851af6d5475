//! Where the resolver looks for referenced objects
//!
//! Defaults follow tmsh. A settings file only needs the keys it changes:
//!
//! ```yaml
//! profiles:
//!   - [ltm, profile]
//!   - [apm, profile]
//!   - [asm, policy]
//!   - [security, bot-defense, profile]
//! record-types: [a, aaaa]
//! ```
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Dialect {
    pub virtual_server: Vec<String>,
    pub pool: Vec<String>,
    pub node: Vec<String>,
    pub monitor: Vec<String>,
    pub persistence: Vec<String>,
    /// Searched in order, the first sub-tree holding the name wins
    pub profiles: Vec<Vec<String>>,
    pub rule: Vec<String>,
    pub policy: Vec<String>,
    pub snatpool: Vec<String>,
    /// SNAT values that are not references
    pub snat_keywords: Vec<String>,
    pub wideip: Vec<String>,
    pub gslb_pool: Vec<String>,
    pub gslb_server: Vec<String>,
    pub record_types: Vec<String>,
}

fn path(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|segment| segment.to_string()).collect()
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            virtual_server: path(&["ltm", "virtual"]),
            pool: path(&["ltm", "pool"]),
            node: path(&["ltm", "node"]),
            monitor: path(&["ltm", "monitor"]),
            persistence: path(&["ltm", "persistence"]),
            profiles: vec![
                path(&["ltm", "profile"]),
                path(&["apm", "profile"]),
                path(&["asm", "policy"]),
            ],
            rule: path(&["ltm", "rule"]),
            policy: path(&["ltm", "policy"]),
            snatpool: path(&["ltm", "snatpool"]),
            snat_keywords: path(&["automap", "none"]),
            wideip: path(&["gtm", "wideip"]),
            gslb_pool: path(&["gtm", "pool"]),
            gslb_server: path(&["gtm", "server"]),
            record_types: path(&["a", "aaaa", "cname", "mx", "naptr", "srv"]),
        }
    }
}

impl Dialect {
    /// Loads settings from a YAML (or JSON) file
    pub fn load(file_path: &Path) -> Result<Self, DialectError> {
        tracing::info!(path=%file_path.display(), "loading dialect settings");
        let reader = std::fs::File::open(file_path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self, DialectError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DialectError {
    #[error("IO error")]
    IoError(#[from] std::io::Error),
    #[error("Unable to parse dialect settings")]
    Invalid(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_settings_keep_defaults() {
        let dialect = Dialect::from_yaml("record-types: [a]\nsnatpool: [ltm, snat-pool]").expect("valid");

        assert_eq!(dialect.record_types, vec!["a"]);
        assert_eq!(dialect.snatpool, vec!["ltm", "snat-pool"]);
        assert_eq!(dialect.pool, Dialect::default().pool);
    }

    #[test]
    fn json_is_accepted() {
        let dialect = Dialect::from_yaml(r#"{"wideip": ["gtm", "wide-ip"]}"#).expect("valid");
        assert_eq!(dialect.wideip, vec!["gtm", "wide-ip"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Dialect::from_yaml("pools: [ltm, pool]").is_err());
    }
}
