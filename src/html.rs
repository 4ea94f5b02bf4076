//! The markup tree and its string serializer.
//!
//! [`Html`] is what the renderer produces from a semantic tree: plain
//! tag/attrs/content nodes with no BEM vocabulary left. [`to_html`] turns it
//! into the final markup string.

use crate::tree::AttrMap;

/// Tags that self-close with no content, regardless of any content supplied.
pub const VOID_TAGS: [&str; 10] = [
    "area", "base", "br", "col", "hr", "img", "input", "link", "meta", "param",
];

/// Default tag used when a node does not specify one.
pub const DEFAULT_TAG: &str = "div";

/// Whether a tag is in the fixed void set.
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

// ---------------------------------------------------------------------------
// Html
// ---------------------------------------------------------------------------

/// A markup tree value.
#[derive(Debug, Clone, Default)]
pub enum Html {
    /// Serializes to the empty string.
    #[default]
    Empty,
    /// Text content, emitted verbatim.
    Text(String),
    /// Ordered sequence, serialized by concatenation.
    Seq(Vec<Html>),
    /// A tag with attributes and content.
    Element(HtmlElement),
}

/// A single markup element.
#[derive(Debug, Clone)]
pub struct HtmlElement {
    pub tag: String,
    pub attrs: AttrMap,
    pub content: Box<Html>,
}

impl HtmlElement {
    /// An element with the given tag and no attributes or content.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: AttrMap::new(),
            content: Box::new(Html::Empty),
        }
    }
}

impl Html {
    /// Push a child onto this value, turning it into a sequence if needed.
    ///
    /// Used by the scheduler to splice a marker node into a finished fragment.
    pub fn push(self, child: Html) -> Html {
        match self {
            Html::Seq(mut items) => {
                items.push(child);
                Html::Seq(items)
            }
            Html::Empty => child,
            other => Html::Seq(vec![other, child]),
        }
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Serialize a markup tree to a string.
pub fn to_html(html: &Html) -> String {
    let mut out = String::new();
    write_html(html, &mut out);
    out
}

fn write_html(html: &Html, out: &mut String) {
    match html {
        Html::Empty => {}
        Html::Text(text) => out.push_str(text),
        Html::Seq(items) => {
            for item in items {
                write_html(item, out);
            }
        }
        Html::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            write_attrs(&el.attrs, out);
            if is_void_tag(&el.tag) {
                // Void tags never render content, even if some was supplied.
                out.push_str("/>");
            } else {
                out.push('>');
                write_html(&el.content, out);
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

/// Attributes in insertion order as ` name="value"`. The only character
/// escaped is the double quote, which would otherwise terminate the value.
fn write_attrs(attrs: &AttrMap, out: &mut String) {
    for (name, value) in attrs.iter() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
}

// ===========================================================================
// Tests
// ===========================================================================
