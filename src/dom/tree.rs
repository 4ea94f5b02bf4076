//! Tree operations: insert, attach rendered markup, walk.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use crate::html::Html;

use super::node::{NodeData, NodeId};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// An in-memory document tree, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so that lookup is O(1). Only element nodes are stored:
/// text content plays no part in behavior binding, so attaching rendered
/// markup drops text leaves.
pub struct Dom {
    nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    root: Option<NodeId>,
}

impl Dom {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
        }
    }

    /// Insert a root-level node (no parent).
    ///
    /// If no root has been set yet, this node becomes the root.
    pub fn insert(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Insert a node as a child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics (debug) if `parent` does not exist in the tree.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        debug_assert!(
            self.nodes.contains_key(parent),
            "parent node does not exist"
        );
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        self.parent.insert(id, parent);
        self.children
            .get_mut(parent)
            .expect("parent must have children vec")
            .push(id);
        id
    }

    /// Attach rendered markup under `parent`, element by element.
    ///
    /// This is what "inserting a fragment into the document" means for the
    /// in-memory host: every element in the markup tree becomes a node, with
    /// its tag and attributes carried over. Returns the ids of the top-level
    /// inserted elements, in document order.
    pub fn attach_html(&mut self, parent: NodeId, html: &Html) -> Vec<NodeId> {
        let mut inserted = Vec::new();
        self.attach_into(parent, html, &mut inserted);
        inserted
    }

    fn attach_into(&mut self, parent: NodeId, html: &Html, inserted: &mut Vec<NodeId>) {
        match html {
            Html::Empty | Html::Text(_) => {}
            Html::Seq(items) => {
                for item in items {
                    self.attach_into(parent, item, inserted);
                }
            }
            Html::Element(el) => {
                let mut data = NodeData::new(el.tag.clone());
                data.attrs = el.attrs.clone();
                let id = self.insert_child(parent, data);
                inserted.push(id);
                let mut nested = Vec::new();
                self.attach_into(id, &el.content, &mut nested);
            }
        }
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no
    /// children or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    /// The current root node, if set.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of nodes in the document.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the document contains a node with the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All strict descendants of `start`, in breadth-first document order.
    pub fn descendants(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut queue: VecDeque<NodeId> = self.children(start).iter().copied().collect();
        while let Some(current) = queue.pop_front() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current) {
                queue.push_back(child);
            }
        }
        result
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
