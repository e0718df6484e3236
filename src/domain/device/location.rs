//! Location tree built from server description paths.
//!
//! Servers carry a `/`-separated location in their description
//! (e.g. `building-a/floor-2`). Appending the server id and merging equal
//! prefixes yields a browsable tree whose leaves are server ids.

use serde::Serialize;

use super::tree::Server;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationNode {
    pub name: String,
    pub children: Vec<LocationNode>,
}

impl LocationNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Merges paths into a forest, keeping first-seen order at every level.
pub fn structurize<S: AsRef<str>>(paths: &[Vec<S>]) -> Vec<LocationNode> {
    let mut groups: Vec<(String, Vec<Vec<&str>>)> = Vec::new();

    for path in paths {
        let Some((head, rest)) = path.split_first() else {
            continue;
        };
        let name = head.as_ref();
        let index = match groups.iter().position(|(n, _)| n == name) {
            Some(i) => i,
            None => {
                groups.push((name.to_string(), Vec::new()));
                groups.len() - 1
            }
        };
        if !rest.is_empty() {
            groups[index]
                .1
                .push(rest.iter().map(|s| s.as_ref()).collect());
        }
    }

    groups
        .into_iter()
        .map(|(name, rest)| LocationNode {
            name,
            children: structurize(&rest),
        })
        .collect()
}

/// Builds the location tree for a forwarder's servers.
pub fn location_tree(servers: &[Server]) -> Vec<LocationNode> {
    let paths: Vec<Vec<String>> = servers
        .iter()
        .map(|server| {
            format!("{}/{}", server.info.desc, server.id)
                .split('/')
                .map(str::to_string)
                .collect()
        })
        .collect();
    structurize(&paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::device::KnownDevice;

    #[test]
    fn structurize_merges_common_prefixes() {
        let paths = vec![
            vec!["campus", "lab", "S-1"],
            vec!["campus", "lab", "S-2"],
            vec!["campus", "roof", "S-3"],
        ];
        let tree = structurize(&paths);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "campus");
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].name, "lab");
        let lab: Vec<&str> = tree[0].children[0]
            .children
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(lab, vec!["S-1", "S-2"]);
        assert!(tree[0].children[1].children[0].is_leaf());
    }

    #[test]
    fn location_tree_appends_server_id_to_description() {
        let servers = vec![
            Server::from_known(KnownDevice::new("S-1").with_desc("north")),
            Server::from_known(KnownDevice::new("S-2").with_desc("south")),
        ];
        let tree = location_tree(&servers);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].name, "north");
        assert_eq!(tree[0].children[0].name, "S-1");
    }

    #[test]
    fn empty_description_yields_empty_root_segment() {
        let servers = vec![Server::from_known(KnownDevice::new("S-1"))];
        let tree = location_tree(&servers);
        assert_eq!(tree[0].name, "");
        assert_eq!(tree[0].children[0].name, "S-1");
    }
}
