//! Declarative DAG traversal.
//!
//! A [`Selector`] describes which blocks a `Get` should pull in, independent
//! of transport. Two selectors are supported: a single block, or the entire
//! reachable DAG. Exchanges and `LinkSystem::is_complete` drive the actual
//! walk with a plain stack, calling `links_to_follow` at each decoded node.

use crate::link::Link;
use crate::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Match only the root block.
    MatchRoot,
    /// Match the root and every block transitively reachable from it.
    MatchAllRecursively,
}

impl Selector {
    /// Given a decoded node, return the links that should be followed next
    /// under this selector. `MatchRoot` never descends.
    pub fn links_to_follow(&self, node: &Node) -> Vec<Link> {
        match self {
            Selector::MatchRoot => Vec::new(),
            Selector::MatchAllRecursively => node.links().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cid;
    use crate::multicodec::RAW;
    use bytes::Bytes;

    #[test]
    fn match_root_never_descends() {
        let node = Node::Raw(Bytes::from_static(b"x"));
        assert!(Selector::MatchRoot.links_to_follow(&node).is_empty());
    }

    #[test]
    fn match_all_recursively_follows_links() {
        let child = cid::of(RAW, b"child");
        let node = Node::Json(serde_json::json!({ "link": { "/": child.to_string() } }));
        let links = Selector::MatchAllRecursively.links_to_follow(&node);
        assert_eq!(links.len(), 1);
    }
}
