//! All sources of one device merged into a single [ConfigTree]
//!
//! Sources are parsed one at a time and unioned into the document. A source that fails to parse is recorded as a
//! [SourceIssue] and contributes nothing, the other sources still merge.
use crate::dialect::Dialect;
use crate::parser::{parse_source, ParseError, ParsedSource};
use crate::resolve::{
    resolve_virtual_server, resolve_virtual_servers, resolve_wideips, AppBundle, GslbBundle,
};
use crate::sources::{ConfSources, RawSource};
use crate::tree::ConfigTree;
use serde::Serialize;

#[derive(Debug, Default)]
pub struct ConfDocument {
    tree: ConfigTree,
    dialect: Dialect,
    version: Option<String>,
    sources: Vec<SourceSummary>,
    issues: Vec<SourceIssue>,
}

/// A source that was merged
#[derive(derive_new::new, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub file_name: String,
    pub size: u64,
    pub object_count: usize,
}

/// A source that was skipped
#[derive(derive_new::new, Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceIssue {
    pub file_name: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: ParseError,
}

/// Everything the document knows, ready to be rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explosion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmos_version: Option<String>,
    pub sources: Vec<SourceSummary>,
    pub apps: Vec<AppBundle>,
    pub fqdns: Vec<GslbBundle>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<SourceIssue>,
}

impl ConfDocument {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    /// Parses and merges every source in order
    pub fn load(&mut self, sources: &ConfSources) {
        for source in sources.iter() {
            self.add_source(source);
        }
    }

    /// Parses and merges one source
    ///
    /// Returns `false` when the source failed to parse. The failure is kept in [ConfDocument::issues].
    pub fn add_source(&mut self, source: &RawSource) -> bool {
        match parse_source(source) {
            Ok(parsed) => {
                self.sources.push(SourceSummary::new(
                    source.file_name.clone(),
                    source.size,
                    parsed.object_count,
                ));
                self.merge(parsed);
                true
            }
            Err(error) => {
                tracing::warn!(file = %source.file_name, %error, "skipping source");
                self.issues
                    .push(SourceIssue::new(source.file_name.clone(), error));
                false
            }
        }
    }

    /// Unions `parsed` into the document, values of `parsed` win conflicts
    pub fn merge(&mut self, parsed: ParsedSource) {
        if parsed.version.is_some() {
            self.version = parsed.version;
        }
        self.tree.merge(parsed.tree);
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Version from the last source that declared one
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn sources(&self) -> &[SourceSummary] {
        &self.sources
    }

    pub fn issues(&self) -> &[SourceIssue] {
        &self.issues
    }

    pub fn hostname(&self) -> Option<&str> {
        self.tree
            .get_object(&["sys", "global-settings"])
            .and_then(|settings| settings.text("hostname"))
    }

    /// Bundle of one virtual server by qualified name
    pub fn app(&self, name: &str) -> Option<AppBundle> {
        let node = self.tree.lookup(&self.dialect.virtual_server, name)?;
        node.as_object()?;
        Some(resolve_virtual_server(name, node, &self.tree, &self.dialect))
    }

    pub fn apps(&self) -> Vec<AppBundle> {
        resolve_virtual_servers(&self.tree, &self.dialect)
    }

    pub fn fqdns(&self) -> Vec<GslbBundle> {
        resolve_wideips(&self.tree, &self.dialect)
    }

    pub fn explode(&self) -> Explosion {
        Explosion {
            hostname: self.hostname().map(str::to_string),
            tmos_version: self.version.clone(),
            sources: self.sources.clone(),
            apps: self.apps(),
            fqdns: self.fqdns(),
            issues: self.issues.clone(),
        }
    }
}

fn serialize_display<S>(value: &impl std::fmt::Display, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(value)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::conf_sources;
    use pretty_assertions::assert_eq;

    #[test]
    fn broken_sources_are_skipped() {
        let sources = conf_sources! {
            "bigip_base.conf" => "sys global-settings {\n    hostname bigip1.example.com\n}\n",
            "bigip.conf" => "ltm pool /Common/broken {\n    members {\n}\n",
            "bigip_gtm.conf" => "gtm datacenter /Common/dc1 { }\n"
        };

        let mut document = ConfDocument::default();
        document.load(&sources);

        let merged: Vec<_> = document.sources().iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(merged, vec!["bigip_base.conf", "bigip_gtm.conf"]);

        assert_eq!(
            document.issues(),
            &[SourceIssue::new(
                "bigip.conf".to_string(),
                ParseError::Unbalanced {
                    line: 1,
                    text: "ltm pool /Common/broken {".to_string()
                }
            )]
        );

        assert_eq!(document.hostname(), Some("bigip1.example.com"));
        assert!(document.tree().get(&["ltm"]).is_none());
        assert!(document
            .tree()
            .get(&["gtm", "datacenter", "/Common/dc1"])
            .is_some());
    }

    #[test]
    fn later_sources_win() {
        let sources = conf_sources! {
            "a.conf" => "#TMSH-VERSION: 15.1.0\nltm pool /Common/p {\n    load-balancing-mode round-robin\n    description first\n}\n",
            "b.conf" => "#TMSH-VERSION: 16.1.3\nltm pool /Common/p {\n    load-balancing-mode least-connections-member\n}\n"
        };

        let mut document = ConfDocument::default();
        document.load(&sources);

        let pool = document
            .tree()
            .get_object(&["ltm", "pool", "/Common/p"])
            .expect("pool");
        assert_eq!(pool.text("load-balancing-mode"), Some("least-connections-member"));
        assert_eq!(pool.text("description"), Some("first"));
        assert_eq!(document.version(), Some("16.1.3"));
    }

    #[test]
    fn app_by_name() {
        let document = {
            let mut document = ConfDocument::default();
            document.load(&conf_sources!(
                "ltm virtual /Common/vs {\n    pool /Common/p\n}\nltm pool /Common/p { }\n"
            ));
            document
        };

        let app = document.app("/Common/vs").expect("app");
        assert_eq!(app.lines.len(), 2);
        assert_eq!(app.pool.as_ref().and_then(|p| p.text("name")), Some("p"));
        assert!(document.app("/Common/other").is_none());
    }

    #[test]
    fn explosion_summary() {
        let mut document = ConfDocument::default();
        document.load(&conf_sources! {
            "bigip.conf" => "#TMSH-VERSION: 17.1.0\nltm virtual /Common/vs { }\n"
        });

        let explosion = document.explode();
        assert_eq!(explosion.tmos_version.as_deref(), Some("17.1.0"));
        assert_eq!(explosion.hostname, None);
        assert_eq!(explosion.apps.len(), 1);
        assert!(explosion.fqdns.is_empty());
        assert_eq!(
            explosion.sources,
            vec![SourceSummary::new("bigip.conf".to_string(), 49, 1)]
        );
    }
}
