//! Waypoint paths for AI drivers.
//!
//! A path is authored as a set of objects tagged `data = pathNode`, each naming
//! its neighbours through `nextNode` / `previousNode`. Links are resolved once
//! at load; a name that matches no node leaves that link empty.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::metadata::AuthoredObject;

/// Index of a node within its path.
pub type NodeId = usize;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathNode {
    pub name: String,
    pub position: Vec3,
    pub next: Option<NodeId>,
    pub previous: Option<NodeId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Path {
    pub name: String,
    pub nodes: Vec<PathNode>,
}

impl Path {
    /// Build a path from authored objects, ignoring anything that is not a path node.
    pub fn from_objects(name: &str, objects: &[AuthoredObject]) -> Self {
        let tagged: Vec<&AuthoredObject> = objects
            .iter()
            .filter(|o| o.get("data") == Some("pathNode"))
            .collect();

        let mut nodes: Vec<PathNode> = tagged
            .iter()
            .map(|o| PathNode {
                name: o.name.clone(),
                position: o.position,
                next: None,
                previous: None,
            })
            .collect();

        let find = |name: Option<&str>| name.and_then(|n| tagged.iter().position(|o| o.name == n));
        for (node, object) in nodes.iter_mut().zip(&tagged) {
            node.next = find(object.get("nextNode"));
            node.previous = find(object.get("previousNode"));
        }

        log::debug!("path `{}` loaded with {} nodes", name, nodes.len());
        Self {
            name: name.to_string(),
            nodes,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&PathNode> {
        self.nodes.get(id)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// A path is looped when following `next` from the first node returns to it.
    pub fn is_looped(&self) -> bool {
        let mut current = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(current).and_then(|n| n.next) {
                Some(0) => return true,
                Some(next) => current = next,
                None => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, x: f32, next: &str, previous: &str) -> AuthoredObject {
        AuthoredObject::new(name, Vec3::new(x, 0.0, 0.0))
            .with_data("data", "pathNode")
            .with_data("nextNode", next)
            .with_data("previousNode", previous)
    }

    #[test]
    fn test_links_resolve_by_name() {
        let path = Path::from_objects(
            "loop",
            &[node("a", 0.0, "b", "c"), node("b", 10.0, "c", "a"), node("c", 20.0, "a", "b")],
        );

        assert_eq!(path.nodes.len(), 3);
        let b = path.find("b").unwrap();
        assert_eq!(path.node(b).unwrap().next, path.find("c"));
        assert_eq!(path.node(b).unwrap().previous, path.find("a"));
        assert!(path.is_looped());
    }

    #[test]
    fn test_missing_link_is_none() {
        let path = Path::from_objects(
            "open",
            &[
                node("a", 0.0, "b", "nowhere"),
                node("b", 10.0, "", "a"),
                AuthoredObject::new("lamp", Vec3::ZERO),
            ],
        );

        assert_eq!(path.nodes.len(), 2, "Untagged objects are not nodes");
        assert_eq!(path.nodes[0].previous, None);
        assert_eq!(path.nodes[1].next, None);
        assert!(!path.is_looped());
    }
}
