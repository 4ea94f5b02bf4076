//! Node types: NodeId, NodeData.

use slotmap::new_key_type;

use crate::name;
use crate::tree::AttrMap;

new_key_type! {
    /// Unique identifier for a document node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// Data associated with a single document node: a tag plus its attributes.
/// The class attribute is the whitespace-delimited token string the behavior
/// runtime scans for block and modifier markers.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Element tag name (e.g. "div", "span").
    pub tag: String,
    /// Attributes, `class` included.
    pub attrs: AttrMap,
}

impl NodeData {
    /// Create a node with the given tag and no attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: AttrMap::new(),
        }
    }

    /// Set an attribute (builder).
    pub fn with_attr(mut self, attr: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.set(attr, value);
        self
    }

    /// Append a class token (builder).
    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// The full class token string. Empty when no class attribute is set.
    pub fn class_attr(&self) -> &str {
        self.attrs.get("class").unwrap_or("")
    }

    /// Replace the full class token string.
    pub fn set_class_attr(&mut self, value: &str) {
        self.attrs.set("class", value);
    }

    /// Exact-token class membership test.
    pub fn has_class(&self, class: &str) -> bool {
        name::has_token(self.class_attr(), class)
    }

    /// Add a class token. No-op if already present.
    pub fn add_class(&mut self, class: &str) {
        let updated = name::add_token(self.class_attr(), class);
        self.attrs.set("class", updated);
    }

    /// Remove a class token. No-op if not present.
    pub fn remove_class(&mut self, class: &str) {
        let updated = name::remove_token(self.class_attr(), class);
        self.attrs.set("class", updated);
    }
}
