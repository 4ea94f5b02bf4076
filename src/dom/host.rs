//! The external DOM collaborator interface.
//!
//! The behavior runtime never mutates a document directly; it goes through
//! [`DomHost`], which covers exactly the primitives the runtime contract
//! needs: the full class-token string of a node, single attributes (one of
//! which holds the JSON-encoded parameter blob), and descendant queries by
//! class. The in-memory [`Dom`](super::Dom) implements it; real hosts bridge
//! to their own document model.

use super::node::NodeId;
use super::tree::Dom;

/// Document primitives consumed by the behavior runtime.
pub trait DomHost {
    /// The full class-token string of a node. Empty string if unset or the
    /// node does not exist.
    fn class_attr(&self, node: NodeId) -> String;

    /// Replace the full class-token string of a node.
    fn set_class_attr(&mut self, node: NodeId, value: &str);

    /// Read a single attribute.
    fn attr(&self, node: NodeId, attr: &str) -> Option<String>;

    /// Write a single attribute.
    fn set_attr(&mut self, node: NodeId, attr: &str, value: &str);

    /// All strict descendants of `container` carrying `class` as an exact
    /// token, in document order.
    fn query_class(&self, container: NodeId, class: &str) -> Vec<NodeId>;
}

impl DomHost for Dom {
    fn class_attr(&self, node: NodeId) -> String {
        self.get(node).map(|d| d.class_attr().to_owned()).unwrap_or_default()
    }

    fn set_class_attr(&mut self, node: NodeId, value: &str) {
        if let Some(data) = self.get_mut(node) {
            data.set_class_attr(value);
        }
    }

    fn attr(&self, node: NodeId, attr: &str) -> Option<String> {
        self.get(node).and_then(|d| d.attrs.get(attr)).map(str::to_owned)
    }

    fn set_attr(&mut self, node: NodeId, attr: &str, value: &str) {
        if let Some(data) = self.get_mut(node) {
            data.attrs.set(attr, value);
        }
    }

    fn query_class(&self, container: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(container)
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(|d| d.has_class(class)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dom::node::NodeData;

    fn build_dom() -> (Dom, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        let menu = dom.insert_child(root, NodeData::new("div").with_class("menu"));
        let item = dom.insert_child(menu, NodeData::new("span").with_class("menu__item"));
        (dom, root, menu, item)
    }

    #[test]
    fn class_attr_roundtrip() {
        let (mut dom, _root, menu, _item) = build_dom();
        assert_eq!(dom.class_attr(menu), "menu");
        dom.set_class_attr(menu, "menu menu--open");
        assert_eq!(dom.class_attr(menu), "menu menu--open");
    }

    #[test]
    fn class_attr_of_missing_node_is_empty() {
        let mut scratch = Dom::new();
        let stale = scratch.insert(NodeData::new("div"));
        let (dom, ..) = build_dom();
        assert_eq!(dom.class_attr(stale), "");
    }

    #[test]
    fn attr_roundtrip() {
        let (mut dom, _root, menu, _item) = build_dom();
        assert_eq!(dom.attr(menu, "data-bem"), None);
        dom.set_attr(menu, "data-bem", "{\"blockId\":1}");
        assert_eq!(dom.attr(menu, "data-bem").as_deref(), Some("{\"blockId\":1}"));
    }

    #[test]
    fn query_class_finds_descendants() {
        let (dom, root, menu, item) = build_dom();
        assert_eq!(dom.query_class(root, "menu"), vec![menu]);
        assert_eq!(dom.query_class(root, "menu__item"), vec![item]);
    }

    #[test]
    fn query_class_excludes_container() {
        let (dom, _root, menu, _item) = build_dom();
        assert!(dom.query_class(menu, "menu").is_empty());
    }

    #[test]
    fn query_class_exact_token() {
        let (dom, root, ..) = build_dom();
        assert!(dom.query_class(root, "men").is_empty());
    }
}
