use super::Fragments;
use crate::dialect::Dialect;
use crate::node::{Node, Object, LINE};
use crate::tree::{declaration, ConfigTree};
use crate::util::QualifiedName;
use indexmap::IndexMap;
use serde::Serialize;

/// A wide IP record and the pools and servers behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GslbBundle {
    /// Last segment of the qualified name, usually the FQDN
    pub name: String,
    /// Qualified name of the record
    pub fqdn: String,
    pub partition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    pub record_type: String,
    pub aliases: Vec<String>,
    /// Pools with their members merged with the matching server virtual servers
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub pools: IndexMap<String, Object>,
    pub all_possible_destinations: Vec<String>,
    pub lines: Vec<String>,
    pub config: Object,
}

/// Bundles every record of every configured record type
pub fn resolve_wideips(tree: &ConfigTree, dialect: &Dialect) -> Vec<GslbBundle> {
    let mut bundles = vec![];

    for record_type in &dialect.record_types {
        let mut path = dialect.wideip.clone();
        path.push(record_type.clone());

        let Some(records) = tree.get_object(&path) else {
            continue;
        };

        bundles.extend(
            records
                .iter()
                .filter(|(_, node)| node.as_object().is_some())
                .map(|(name, node)| resolve_wideip(record_type, name, node, tree, dialect)),
        );
    }

    bundles
}

#[tracing::instrument(level = "debug", skip(node, tree, dialect))]
pub fn resolve_wideip(
    record_type: &str,
    name: &str,
    node: &Node,
    tree: &ConfigTree,
    dialect: &Dialect,
) -> GslbBundle {
    let mut config = node.as_object().cloned().unwrap_or_default();
    let qualified = QualifiedName::parse(name);

    let mut record_path = dialect.wideip.clone();
    record_path.push(record_type.to_string());

    let mut lines = Fragments::default();
    lines.push(declaration(&record_path, name, node));

    let aliases = config.get("aliases").map(Node::names).unwrap_or_default();
    if config.get("aliases").is_some() {
        config.insert("aliases", aliases.clone());
    }

    let mut pool_path = dialect.gslb_pool.clone();
    pool_path.push(record_type.to_string());

    let mut destinations = Destinations::default();
    let mut pools = IndexMap::new();

    for pool_name in pool_references(&config) {
        let Some(found) = tree.lookup(&pool_path, &pool_name) else {
            tracing::debug!(pool = %pool_name, "gslb pool not found");
            continue;
        };
        lines.push(declaration(&pool_path, &pool_name, found));

        let Some(mut pool) = found.as_object().cloned() else {
            continue;
        };

        if let Some(fallback) = pool.text("fallback-ip") {
            destinations.push(fallback.to_string());
        }

        if let Some(Node::Object(members)) = pool.get_mut("members") {
            for (member, entry) in members.entries.iter_mut() {
                if member == LINE {
                    continue;
                }
                resolve_member(member, entry, tree, dialect, &mut lines, &mut destinations);
            }
        }

        pools.insert(pool_name, pool);
    }

    GslbBundle {
        name: qualified
            .as_ref()
            .map(|q| q.name.to_string())
            .unwrap_or_else(|| name.rsplit('/').next().unwrap_or(name).to_string()),
        fqdn: name.to_string(),
        partition: qualified
            .as_ref()
            .map(|q| q.partition.to_string())
            .unwrap_or_default(),
        folder: qualified.and_then(|q| q.folder),
        record_type: record_type.to_string(),
        aliases,
        pools,
        all_possible_destinations: destinations.0,
        lines: lines.into_inner(),
        config,
    }
}

/// Pool names of a record, `pools-cname` included
fn pool_references(config: &Object) -> Vec<String> {
    ["pools", "pools-cname"]
        .iter()
        .filter_map(|key| config.get(key))
        .flat_map(Node::names)
        .collect()
}

/// `server:virtual-server` member, resolved against the server's `virtual-servers`
fn resolve_member(
    member: &str,
    entry: &mut Node,
    tree: &ConfigTree,
    dialect: &Dialect,
    lines: &mut Fragments,
    destinations: &mut Destinations,
) {
    let Some((server_name, vs_name)) = member.split_once(':') else {
        tracing::debug!(member, "gslb pool member without server");
        return;
    };

    let Some(server) = tree.lookup(&dialect.gslb_server, server_name) else {
        tracing::debug!(server = server_name, "gslb server not found");
        return;
    };
    lines.push(declaration(&dialect.gslb_server, server_name, server));

    let virtual_servers = server
        .as_object()
        .and_then(|server| server.object("virtual-servers"));
    let bare = vs_name.rsplit('/').next().unwrap_or(vs_name);
    let Some(virtual_server) = virtual_servers
        .and_then(|vs| vs.object(vs_name).or_else(|| vs.object(bare)))
    else {
        tracing::debug!(server = server_name, virtual_server = vs_name, "server virtual server not found");
        return;
    };

    if let Some(destination) = effective_destination(virtual_server) {
        destinations.push(destination);
    }

    if !matches!(entry, Node::Object(_)) {
        *entry = Object::default().into();
    }
    if let Node::Object(entry) = entry {
        for (key, value) in virtual_server.iter() {
            if key != LINE {
                entry.insert(key.clone(), value.clone());
            }
        }
    }
}

/// `destination`, or `destination->NAT->address[:port]` when the server translates it
fn effective_destination(virtual_server: &Object) -> Option<String> {
    let destination = virtual_server.text("destination")?;

    let address = virtual_server
        .text("translation-address")
        .filter(|address| !address.is_empty() && *address != "none");
    let port = virtual_server
        .text("translation-port")
        .filter(|port| !port.is_empty() && *port != "0");

    Some(match (address, port) {
        (Some(address), Some(port)) => format!("{destination}->NAT->{address}:{port}"),
        (Some(address), None) => format!("{destination}->NAT->{address}"),
        _ => destination.to_string(),
    })
}

#[derive(Debug, Default)]
struct Destinations(Vec<String>);

impl Destinations {
    fn push(&mut self, destination: String) {
        if !self.0.contains(&destination) {
            self.0.push(destination);
        }
    }
}
