//! The author-facing semantic tree.
//!
//! Authors describe UI as a tree of [`Bem`] values: ordered sequences, text
//! leaves, the empty leaf, and structured [`BemNode`]s carrying the BEM
//! vocabulary (`block`, `element`, `mods`, `wrapper`, `content`) plus the
//! passthrough markup fields (`tag`, `attrs`). Render customizations
//! registered in the [`Registry`](crate::registry::Registry) mutate these
//! nodes before they are converted to markup.

use crate::html::Html;

// ---------------------------------------------------------------------------
// AttrMap
// ---------------------------------------------------------------------------

/// Insertion-ordered string→string attribute map.
///
/// Serialization order is insertion order, so this is Vec-backed rather than
/// hashed. `set` on an existing key overwrites the value in place, keeping
/// the key's original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrMap {
    entries: Vec<(String, String)>,
}

impl AttrMap {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute. Overwrites in place if the key already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Append a class to the `class` attribute, space-separated.
    pub fn append_class(&mut self, class: &str) {
        match self.entries.iter_mut().find(|(n, _)| n == "class") {
            Some((_, value)) => {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(class);
            }
            None => self.entries.push(("class".to_owned(), class.to_owned())),
        }
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for AttrMap {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut map = AttrMap::new();
        for (n, v) in iter {
            map.set(n, v);
        }
        map
    }
}

// ---------------------------------------------------------------------------
// Bem
// ---------------------------------------------------------------------------

/// A semantic tree value.
#[derive(Debug, Clone, Default)]
pub enum Bem {
    /// The falsy leaf. Renders to the empty string.
    #[default]
    Empty,
    /// A text leaf, emitted verbatim by the serializer.
    Text(String),
    /// An ordered sequence, rendered by concatenation.
    Seq(Vec<Bem>),
    /// A structured node.
    Node(Box<BemNode>),
    /// Already-rendered markup, spliced into the output verbatim. The
    /// renderer uses this to hand a node's finished rendering to its wrapper;
    /// it also serves as the raw-markup escape hatch for authors.
    Raw(Html),
}

impl Bem {
    /// A structured node wrapping the given data.
    pub fn node(node: BemNode) -> Self {
        Bem::Node(Box::new(node))
    }

    /// Whether this value is the falsy leaf.
    pub fn is_empty_leaf(&self) -> bool {
        matches!(self, Bem::Empty)
    }

    /// Borrow the structured node, if this is one.
    pub fn as_node(&self) -> Option<&BemNode> {
        match self {
            Bem::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl From<&str> for Bem {
    fn from(s: &str) -> Self {
        Bem::Text(s.to_owned())
    }
}

impl From<String> for Bem {
    fn from(s: String) -> Self {
        Bem::Text(s)
    }
}

impl From<Vec<Bem>> for Bem {
    fn from(children: Vec<Bem>) -> Self {
        Bem::Seq(children)
    }
}

impl From<BemNode> for Bem {
    fn from(node: BemNode) -> Self {
        Bem::node(node)
    }
}

// ---------------------------------------------------------------------------
// BemNode
// ---------------------------------------------------------------------------

/// A structured semantic node.
///
/// `block` and `element` are mutually exclusive on the same node; `mods` only
/// applies alongside `block`. Handlers registered in the registry receive the
/// node mutably and may change any field, including setting `wrapper`.
#[derive(Debug, Clone, Default)]
pub struct BemNode {
    /// Block name, if this node opens a block scope.
    pub block: Option<String>,
    /// Element name, resolved against the nearest ancestor block scope.
    pub element: Option<String>,
    /// Active modifier names, in declared order.
    pub mods: Vec<String>,
    /// Replacement node: when set, the wrapper's rendering entirely replaces
    /// this node's, with this node attached as the wrapper's content.
    pub wrapper: Option<Bem>,
    /// Nested content.
    pub content: Option<Bem>,
    /// Markup tag. Defaults to `div` when unset.
    pub tag: Option<String>,
    /// Markup attributes.
    pub attrs: AttrMap,
}

impl BemNode {
    /// A node with no fields set. Renders as an empty `<div></div>`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A block node.
    pub fn block(name: impl Into<String>) -> Self {
        Self {
            block: Some(name.into()),
            ..Self::default()
        }
    }

    /// An element node.
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            element: Some(name.into()),
            ..Self::default()
        }
    }

    /// A plain markup node with the given tag.
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// Add a modifier (builder).
    pub fn with_mod(mut self, m: impl Into<String>) -> Self {
        self.mods.push(m.into());
        self
    }

    /// Add multiple modifiers (builder).
    pub fn with_mods(mut self, mods: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.mods.extend(mods.into_iter().map(Into::into));
        self
    }

    /// Set the tag (builder).
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set an attribute (builder).
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.set(name, value);
        self
    }

    /// Set the content (builder).
    pub fn with_content(mut self, content: impl Into<Bem>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the wrapper (builder).
    pub fn with_wrapper(mut self, wrapper: impl Into<Bem>) -> Self {
        self.wrapper = Some(wrapper.into());
        self
    }
}

// ===========================================================================
// Tests
// ===========================================================================
