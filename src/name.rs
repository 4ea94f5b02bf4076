//! Canonical names and class-token utilities.
//!
//! Declarations are keyed by canonical name: a base block by its own name
//! (`menu`), a block+modifier pair by the composite `menu--vertical`. The same
//! strings double as the CSS classes the renderer emits and the runtime scans
//! for, so the separators here are the single source of truth for both sides.

/// Separator between a block name and a modifier name.
pub const MOD_SEPARATOR: &str = "--";

/// Separator between a block name and an element name.
pub const ELEMENT_SEPARATOR: &str = "__";

/// Canonical key for a declaration: `block` or `block--mod`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalName(pub String);

impl CanonicalName {
    /// Canonical name of a base block.
    pub fn block(block: impl Into<String>) -> Self {
        CanonicalName(block.into())
    }

    /// Canonical name of a block+modifier pair (`block--mod`, composite,
    /// never nested).
    pub fn with_mod(block: &str, m: &str) -> Self {
        CanonicalName(mod_class(block, m))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CanonicalName {
    fn from(s: &str) -> Self {
        CanonicalName(s.to_owned())
    }
}

impl From<String> for CanonicalName {
    fn from(s: String) -> Self {
        CanonicalName(s)
    }
}

/// Class (and canonical name) for a block modifier: `block--mod`.
pub fn mod_class(block: &str, m: &str) -> String {
    format!("{block}{MOD_SEPARATOR}{m}")
}

/// Class for a block's element: `block__element`.
pub fn element_class(block: &str, element: &str) -> String {
    format!("{block}{ELEMENT_SEPARATOR}{element}")
}

/// Declaration lookup order for a block with the given modifiers:
/// most specific first (`block--mod` per mod, in declared order), the base
/// block last. Render dispatch walks this list and stops at the first hit.
pub fn search_order(block: &str, mods: &[String]) -> Vec<CanonicalName> {
    let mut names: Vec<CanonicalName> = mods
        .iter()
        .map(|m| CanonicalName::with_mod(block, m))
        .collect();
    names.push(CanonicalName::block(block));
    names
}

// ---------------------------------------------------------------------------
// Class-token string helpers
// ---------------------------------------------------------------------------
//
// The runtime's only assumption about a node's class attribute is that it is
// a whitespace-delimited token list. Membership is exact-token, never
// substring; append is idempotent.

/// Exact whitespace-delimited token membership test.
pub fn has_token(class_attr: &str, token: &str) -> bool {
    class_attr.split_whitespace().any(|t| t == token)
}

/// Append a token to a class string. No-op if the exact token is already
/// present.
pub fn add_token(class_attr: &str, token: &str) -> String {
    if has_token(class_attr, token) {
        return class_attr.to_owned();
    }
    if class_attr.is_empty() {
        token.to_owned()
    } else {
        format!("{class_attr} {token}")
    }
}

/// Remove a token from a class string. No-op if the token is absent.
pub fn remove_token(class_attr: &str, token: &str) -> String {
    class_attr
        .split_whitespace()
        .filter(|t| *t != token)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The base block of a canonical name: everything before the first modifier
/// separator. Plain block names pass through unchanged.
pub fn base_block(name: &str) -> &str {
    name.split(MOD_SEPARATOR).next().unwrap_or(name)
}

/// All modifier names of `block` present in a class string, in the order
/// their tokens appear.
pub fn mods_in_class(class_attr: &str, block: &str) -> Vec<String> {
    let prefix = format!("{block}{MOD_SEPARATOR}");
    class_attr
        .split_whitespace()
        .filter_map(|t| t.strip_prefix(&prefix))
        .map(str::to_owned)
        .collect()
}

// ===========================================================================
// Tests
// ===========================================================================
