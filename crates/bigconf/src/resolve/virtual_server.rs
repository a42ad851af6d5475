use super::Fragments;
use crate::dialect::Dialect;
use crate::node::{Node, Object};
use crate::patterns::{MONITOR_MIN_OF, POLICY_POOL};
use crate::tree::{declaration, ConfigTree};
use crate::util::{split_member, QualifiedName};
use indexmap::IndexMap;
use serde::Serialize;

/// A virtual server and everything it references
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppBundle {
    /// Qualified name of the virtual server
    pub name: String,
    pub partition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<Object>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub profiles: IndexMap<String, Node>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub rules: IndexMap<String, Node>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub policies: IndexMap<String, Node>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub persist: IndexMap<String, Node>,
    /// The SNAT pool object, or the `automap`/`none` keyword
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snat: Option<Node>,
    /// Declaration of the virtual server first, then every resolved dependency
    pub lines: Vec<String>,
    /// Copy of the virtual server itself
    pub config: Object,
}

/// Bundles every virtual server in the tree
pub fn resolve_virtual_servers(tree: &ConfigTree, dialect: &Dialect) -> Vec<AppBundle> {
    let Some(virtual_servers) = tree.get_object(&dialect.virtual_server) else {
        return vec![];
    };

    virtual_servers
        .iter()
        .filter(|(_, node)| node.as_object().is_some())
        .map(|(name, node)| resolve_virtual_server(name, node, tree, dialect))
        .collect()
}

#[tracing::instrument(level = "debug", skip(node, tree, dialect))]
pub fn resolve_virtual_server(
    name: &str,
    node: &Node,
    tree: &ConfigTree,
    dialect: &Dialect,
) -> AppBundle {
    let config = node.as_object().cloned().unwrap_or_default();
    let qualified = QualifiedName::parse(name);

    let mut resolver = Resolver {
        tree,
        dialect,
        lines: Fragments::default(),
    };
    resolver
        .lines
        .push(declaration(&dialect.virtual_server, name, node));

    let pool = config.text("pool").and_then(|pool| resolver.pool(pool));

    let mut profiles = IndexMap::new();
    for profile in names(&config, "profiles") {
        if let Some(found) = resolver.profile(&profile) {
            profiles.insert(profile, found);
        }
    }

    let mut rules = IndexMap::new();
    for rule in names(&config, "rules") {
        if let Some(found) = resolver.direct(&dialect.rule, &rule) {
            rules.insert(rule, found);
        }
    }

    let mut policies = IndexMap::new();
    for policy in names(&config, "policies") {
        if let Some(found) = resolver.policy(&policy) {
            policies.insert(policy, found);
        }
    }

    let mut persist = IndexMap::new();
    let fallback = config.text("fallback-persistence").map(str::to_string);
    for profile in names(&config, "persist").into_iter().chain(fallback) {
        if let Some(found) = resolver.named(&dialect.persistence, &profile) {
            persist.insert(profile, found);
        }
    }

    let snat = resolver.snat(&config);

    AppBundle {
        name: name.to_string(),
        partition: qualified
            .as_ref()
            .map(|q| q.partition.to_string())
            .unwrap_or_default(),
        folder: qualified.and_then(|q| q.folder),
        destination: config.text("destination").map(str::to_string),
        pool,
        profiles,
        rules,
        policies,
        persist,
        snat,
        lines: resolver.lines.into_inner(),
        config,
    }
}

struct Resolver<'t> {
    tree: &'t ConfigTree,
    dialect: &'t Dialect,
    lines: Fragments,
}

impl<'t> Resolver<'t> {
    /// Pool, its nodes and monitors
    fn pool(&mut self, name: &str) -> Option<Object> {
        let dialect = self.dialect;
        let node = self.direct(&dialect.pool, name)?;
        let pool = node.as_object()?.clone();

        let members = pool.object("members");
        let member_names = pool.get("members").map(Node::names).unwrap_or_default();

        for member in &member_names {
            let (node_name, _port) = split_member(member);
            self.direct(&dialect.node, node_name);
        }

        let mut monitors = monitor_names(&pool);
        for member in &member_names {
            if let Some(member) = members.and_then(|members| members.object(member)) {
                monitors.extend(monitor_names(member));
            }
        }

        for monitor in monitors {
            self.named(&dialect.monitor, &monitor);
        }

        Some(pool)
    }

    /// First of the profile sub-trees that holds `name`
    fn profile(&mut self, name: &str) -> Option<Node> {
        let (tree, dialect) = (self.tree, self.dialect);
        let found = dialect
            .profiles
            .iter()
            .find_map(|prefix| tree.find_named(prefix, name));

        let Some(found) = found else {
            tracing::debug!(profile = name, "profile not found");
            return None;
        };

        self.lines.push(declaration(found.path, name, found.node));
        Some(found.node.clone())
    }

    /// Policy plus the pools its actions forward to
    fn policy(&mut self, name: &str) -> Option<Node> {
        let dialect = self.dialect;
        let policy = self.direct(&dialect.policy, name)?;
        let text = declaration(&dialect.policy, name, &policy);

        let mut pools: Vec<&str> = vec![];
        for captures in POLICY_POOL.captures_iter(&text) {
            let pool = captures.get(1).map_or("", |m| m.as_str());
            if !pools.contains(&pool) {
                pools.push(pool);
            }
        }

        for pool in pools {
            self.direct(&dialect.pool, pool);
        }

        Some(policy)
    }

    fn snat(&mut self, config: &Object) -> Option<Node> {
        let translation = config.object("source-address-translation");
        let reference = translation
            .and_then(|t| t.text("pool"))
            .or_else(|| config.text("snatpool"));
        let kind = translation
            .and_then(|t| t.text("type"))
            .or_else(|| config.text("snat"));

        let dialect = self.dialect;
        let is_keyword = |value: &&str| dialect.snat_keywords.iter().any(|k| k.as_str() == *value);

        match reference {
            Some(name) if !is_keyword(&name) => self.direct(&dialect.snatpool, name),
            Some(keyword) => Some(Node::from(keyword)),
            None => kind.filter(is_keyword).map(Node::from),
        }
    }

    /// Object filed directly under `parent`
    fn direct(&mut self, parent: &[String], name: &str) -> Option<Node> {
        let tree = self.tree;
        let Some(node) = tree.lookup(parent, name) else {
            tracing::debug!(?parent, name, "reference not found");
            return None;
        };

        self.lines.push(declaration(parent, name, node));
        Some(node.clone())
    }

    /// Object filed anywhere below `prefix`
    fn named(&mut self, prefix: &[String], name: &str) -> Option<Node> {
        let tree = self.tree;
        let Some(found) = tree.find_named(prefix, name) else {
            tracing::debug!(?prefix, name, "reference not found");
            return None;
        };

        self.lines.push(declaration(found.path, name, found.node));
        Some(found.node.clone())
    }
}

fn names(config: &Object, key: &str) -> Vec<String> {
    config.get(key).map(Node::names).unwrap_or_default()
}

/// Monitor references of a pool or member
///
/// `monitor /Common/http and /Common/tcp`, `monitor min 1 of { ... }` (token list)
fn monitor_names(object: &Object) -> Vec<String> {
    object
        .iter()
        .filter(|(key, _)| key.as_str() == "monitor" || MONITOR_MIN_OF.is_match(key))
        .flat_map(|(_, value)| value.names())
        .filter(|name| name.starts_with('/'))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse_source;
    use crate::sources::RawSource;
    use pretty_assertions::assert_eq;

    const CONF: &str = "\
ltm virtual /Common/app_vs {
    destination /Common/10.1.1.10:443
    ip-protocol tcp
    pool /Common/web_pool
    profiles {
        /Common/http { }
        /Common/app_tcp {
            context all
        }
        /Common/missing { }
    }
    rules {
        /Common/redirect
    }
    persist {
        /Common/app_cookie {
            default yes
        }
    }
    fallback-persistence /Common/app_source
    policies {
        /Common/routing { }
    }
    source-address-translation {
        pool /Common/app_snat
        type snat
    }
}
ltm pool /Common/web_pool {
    load-balancing-mode round-robin
    members {
        /Common/10.0.0.1:80 {
            address 10.0.0.1
        }
        /Common/10.0.0.2:80 {
            address 10.0.0.2
            monitor /Common/app_icmp
        }
    }
    monitor /Common/app_http and /Common/tcp
}
ltm pool /Common/api_pool {
    members {
        /Common/10.0.0.3:8080 {
            address 10.0.0.3
        }
    }
}
ltm node /Common/10.0.0.1 {
    address 10.0.0.1
}
ltm node /Common/10.0.0.2 {
    address 10.0.0.2
}
ltm monitor http /Common/app_http {
    send \"GET /\\r\\n\"
}
ltm monitor gateway-icmp /Common/app_icmp { }
ltm profile tcp /Common/app_tcp {
    defaults-from /Common/tcp
}
ltm persistence cookie /Common/app_cookie {
    defaults-from /Common/cookie
}
ltm persistence source-addr /Common/app_source { }
ltm rule /Common/redirect {
when HTTP_REQUEST {
  HTTP::redirect https://[HTTP::host][HTTP::uri]
}
}
ltm policy /Common/routing {
    rules {
        api {
            actions {
                0 {
                    forward
                    select
                    pool /Common/api_pool
                }
            }
        }
    }
    strategy /Common/first-match
}
ltm snatpool /Common/app_snat {
    members {
        /Common/10.9.9.9
    }
}
";

    fn tree() -> ConfigTree {
        parse_source(&RawSource::from_text("bigip.conf", CONF))
            .expect("parses")
            .tree
    }

    fn bundle(tree: &ConfigTree) -> AppBundle {
        let dialect = Dialect::default();
        let node = tree
            .lookup(&dialect.virtual_server, "/Common/app_vs")
            .expect("virtual server");
        resolve_virtual_server("/Common/app_vs", node, tree, &dialect)
    }

    fn titles(lines: &[String]) -> Vec<&str> {
        lines
            .iter()
            .map(|line| line.split(" {").next().unwrap_or_default())
            .collect()
    }

    #[test]
    fn fragments_in_dependency_order() {
        let tree = tree();
        let bundle = bundle(&tree);

        assert_eq!(
            titles(&bundle.lines),
            vec![
                "ltm virtual /Common/app_vs",
                "ltm pool /Common/web_pool",
                "ltm node /Common/10.0.0.1",
                "ltm node /Common/10.0.0.2",
                "ltm monitor http /Common/app_http",
                "ltm monitor gateway-icmp /Common/app_icmp",
                "ltm profile tcp /Common/app_tcp",
                "ltm rule /Common/redirect",
                "ltm policy /Common/routing",
                "ltm pool /Common/api_pool",
                "ltm persistence cookie /Common/app_cookie",
                "ltm persistence source-addr /Common/app_source",
                "ltm snatpool /Common/app_snat",
            ]
        );
    }

    #[test]
    fn resolved_objects_are_copies() {
        let tree = tree();
        let bundle = bundle(&tree);

        assert_eq!(bundle.partition, "Common");
        assert_eq!(bundle.folder, None);
        assert_eq!(bundle.destination.as_deref(), Some("/Common/10.1.1.10:443"));
        assert_eq!(
            bundle.pool.as_ref().and_then(|p| p.text("load-balancing-mode")),
            Some("round-robin")
        );

        let profiles: Vec<_> = bundle.profiles.keys().map(String::as_str).collect();
        assert_eq!(profiles, vec!["/Common/app_tcp"]);
        assert_eq!(
            bundle.rules.get("/Common/redirect").and_then(Node::as_text),
            Some("when HTTP_REQUEST {\n  HTTP::redirect https://[HTTP::host][HTTP::uri]\n}")
        );

        let persist: Vec<_> = bundle.persist.keys().map(String::as_str).collect();
        assert_eq!(persist, vec!["/Common/app_cookie", "/Common/app_source"]);

        let snat = bundle.snat.as_ref().and_then(Node::as_object).expect("snat pool");
        assert_eq!(snat.text("name"), Some("app_snat"));

        assert_eq!(
            Some(&Node::from(bundle.config.clone())),
            tree.get(&["ltm", "virtual", "/Common/app_vs"])
        );
    }

    #[test]
    fn rule_fragment_is_verbatim() {
        let tree = tree();
        let bundle = bundle(&tree);

        insta::assert_snapshot!(bundle.lines[7], @r###"
        ltm rule /Common/redirect {
        when HTTP_REQUEST {
          HTTP::redirect https://[HTTP::host][HTTP::uri]
        }
        }
        "###);
    }

    #[test]
    fn missing_references_are_omitted() {
        let tree = parse_source(&RawSource::from_text(
            "bigip.conf",
            "ltm virtual /Common/lonely {\n    pool /Common/gone\n    rules { /Common/nothing }\n    snat automap\n}\n",
        ))
        .expect("parses")
        .tree;

        let dialect = Dialect::default();
        let bundles = resolve_virtual_servers(&tree, &dialect);
        assert_eq!(bundles.len(), 1);

        let bundle = &bundles[0];
        assert_eq!(bundle.lines.len(), 1);
        assert_eq!(bundle.pool, None);
        assert!(bundle.rules.is_empty());
        assert_eq!(bundle.snat, Some(Node::from("automap")));
    }

    #[test]
    fn monitor_min_of_references() {
        let mut pool = Object::default();
        pool.insert(
            "monitor min 1 of",
            vec!["/Common/a".to_string(), "/Common/b".to_string()],
        );
        assert_eq!(monitor_names(&pool), vec!["/Common/a", "/Common/b"]);
    }
}
