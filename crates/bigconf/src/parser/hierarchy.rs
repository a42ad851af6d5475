use crate::node::{Node, Object, LINE};
use crate::tree::ConfigTree;
use crate::util::QualifiedName;
use crate::visit::VisitObjectsMut;
use indexmap::IndexMap;

/// Files flat `title -> node` pairs into a [ConfigTree]
///
/// `ltm profile http /Common/http` becomes `ltm -> profile -> http -> /Common/http`. Titles without a
/// qualified name (`sys global-settings`) use everything after the category as key.
pub fn hierarchize(objects: IndexMap<String, Node>) -> ConfigTree {
    let mut tree = ConfigTree::default();

    for (title, mut node) in objects {
        let tokens: Vec<&str> = title.split_whitespace().collect();
        let Some((category, rest)) = tokens.split_first() else {
            tracing::debug!("ignoring object without title");
            continue;
        };

        move_bodies_to_line(&mut node);

        match rest.iter().position(|token| token.starts_with('/')) {
            Some(position) => {
                let mut path = vec![category.to_string()];
                path.extend(rest[..position].iter().map(|token| token.to_string()));
                let name = rest[position..].join(" ");

                if let Node::Object(object) = &mut node {
                    attach_name(object, &name);
                }

                tree.insert_named(path, name, node);
            }
            None if rest.is_empty() => tree.insert(&[], *category, node),
            None => tree.insert(&[category.to_string()], rest.join(" "), node),
        }
    }

    tree
}

fn move_bodies_to_line(node: &mut Node) {
    node.visit_objects_mut(&mut |object: &mut Object| {
        if let Some(body) = object.take_body() {
            object.insert(LINE, body);
        }
    });
}

fn attach_name(object: &mut Object, qualified: &str) {
    let Some(name) = QualifiedName::parse(qualified) else {
        return;
    };

    object.insert("partition", name.partition);
    if let Some(folder) = name.folder {
        object.insert("folder", folder);
    }
    object.insert("name", name.name);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::{build_group, group_objects, preprocess};
    use pretty_assertions::assert_eq;

    fn tree(text: &str) -> ConfigTree {
        let lines = preprocess(text).into_content_lines();
        let objects = group_objects(&lines)
            .expect("groups")
            .iter()
            .map(|group| build_group(&group.lines))
            .collect();
        hierarchize(objects)
    }

    #[test]
    fn files_by_category_subtypes_and_name() {
        let tree = tree(
            "ltm pool /Common/web_pool {
    load-balancing-mode round-robin
    members {
        /Common/10.0.0.1:80 {
            address 10.0.0.1
        }
    }
}
ltm profile http /Tenant/app/http_x {
    defaults-from /Common/http
}
sys global-settings {
    hostname bigip1.example.com
}",
        );

        let pool = tree
            .get_object(&["ltm", "pool", "/Common/web_pool"])
            .expect("pool");
        assert_eq!(pool.text("load-balancing-mode"), Some("round-robin"));
        assert_eq!(pool.text("partition"), Some("Common"));
        assert_eq!(pool.text("name"), Some("web_pool"));
        assert_eq!(pool.text("folder"), None);

        let profile = tree
            .get_object(&["ltm", "profile", "http", "/Tenant/app/http_x"])
            .expect("profile");
        assert_eq!(profile.text("partition"), Some("Tenant"));
        assert_eq!(profile.text("folder"), Some("app"));
        assert_eq!(profile.text(LINE), Some("    defaults-from /Common/http"));

        assert_eq!(
            tree.get(&["sys", "global-settings", "hostname"]),
            Some(&Node::from("bigip1.example.com"))
        );

        let paths: Vec<_> = tree.index().paths("/Tenant/app/http_x").collect();
        assert_eq!(paths, vec![&vec!["ltm".to_string(), "profile".into(), "http".into()]]);
    }

    #[test]
    fn line_is_set_at_every_depth() {
        let tree = tree(
            "ltm pool /Common/p {
    members {
        /Common/n:80 {
            address 10.0.0.1
        }
    }
}",
        );

        let members = tree
            .get_object(&["ltm", "pool", "/Common/p", "members"])
            .expect("members");
        assert_eq!(
            members.text(LINE),
            Some("    /Common/n:80 {\n        address 10.0.0.1\n    }")
        );
        assert_eq!(
            members.object("/Common/n:80").and_then(|m| m.text(LINE)),
            Some("    address 10.0.0.1")
        );
        assert!(members.body.is_none());
    }

    #[test]
    fn root_lines_reproduce_bodies() {
        let body = "    destination /Common/10.0.0.10:443\n    ip-protocol tcp\n    profiles {\n        /Common/tcp { }\n    }";
        let tree = tree(&format!("ltm virtual /Common/vs {{\n{body}\n}}\n"));

        assert_eq!(
            tree.get_object(&["ltm", "virtual", "/Common/vs"])
                .and_then(|vs| vs.text(LINE)),
            Some(body)
        );
    }

    #[test]
    fn scripts_are_stored_as_text() {
        let tree = tree("ltm rule /Common/r {\nwhen HTTP_REQUEST { }\n}");
        assert_eq!(
            tree.get(&["ltm", "rule", "/Common/r"]),
            Some(&Node::from("when HTTP_REQUEST { }"))
        );
    }
}
