//! Declaration registry: named render customizations and behavior bundles.
//!
//! A [`Declaration`] bundles two independent capability groups under one
//! canonical name: the render group (an on-block handler plus per-element
//! handlers, consulted by the renderer) and the behavior group (an init
//! trigger, an init method, per-modifier activation hooks, and an open method
//! table, consumed by the composition runtime).
//!
//! Re-declaring a canonical name merges into the existing entry rather than
//! replacing it; this is the supported way to extend a block from several
//! call sites.

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::behavior::Call;
use crate::name::CanonicalName;
use crate::tree::BemNode;

/// A render customization: receives the semantic node mutably before it is
/// converted to markup.
pub type BlockHandler = Rc<dyn Fn(&mut BemNode)>;

/// A behavior method implementation for one layer. Receives the delegation
/// context and an `Any` argument payload; may return an `Any` result.
pub type Method = Rc<dyn Fn(&mut Call<'_>, &dyn Any) -> Option<Box<dyn Any>>>;

/// A modifier on-activate hook.
pub type Hook = Rc<dyn Fn(&mut Call<'_>)>;

// ---------------------------------------------------------------------------
// InitTrigger
// ---------------------------------------------------------------------------

/// When a block's behavior is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitTrigger {
    /// Eager: initialized during the page-load sweep.
    #[default]
    Load,
    /// Lazy: initialized only once the rendered fragment is attached.
    Insert,
}

// ---------------------------------------------------------------------------
// Declaration
// ---------------------------------------------------------------------------

/// Render customizations for one canonical name.
#[derive(Clone, Default)]
pub struct RenderGroup {
    /// Handler invoked on block nodes dispatching to this declaration.
    pub on_block: Option<BlockHandler>,
    /// Handlers keyed by element name.
    pub on_element: HashMap<String, BlockHandler>,
}

/// Behavior capabilities for one canonical name.
#[derive(Clone, Default)]
pub struct BehaviorGroup {
    /// Init trigger policy. `None` means the default ([`InitTrigger::Load`]).
    pub init_on: Option<InitTrigger>,
    /// Initialization method, run once per instance under the reserved chain
    /// name `init`.
    pub init: Option<Method>,
    /// On-activate hooks keyed by modifier name.
    pub on_mod: HashMap<String, Hook>,
    /// Open method table.
    pub methods: HashMap<String, Method>,
}

impl BehaviorGroup {
    /// The effective trigger, applying the default.
    pub fn trigger(&self) -> InitTrigger {
        self.init_on.unwrap_or_default()
    }

    /// Whether this group carries any behavior at all.
    pub fn is_empty(&self) -> bool {
        self.init_on.is_none()
            && self.init.is_none()
            && self.on_mod.is_empty()
            && self.methods.is_empty()
    }
}

/// The registered bundle for one canonical name. Either group may be empty.
#[derive(Clone, Default)]
pub struct Declaration {
    pub render: RenderGroup,
    pub behavior: BehaviorGroup,
}

impl Declaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the on-block render handler (builder).
    pub fn on_block(mut self, handler: impl Fn(&mut BemNode) + 'static) -> Self {
        self.render.on_block = Some(Rc::new(handler));
        self
    }

    /// Set the render handler for one element (builder).
    pub fn on_element(
        mut self,
        element: impl Into<String>,
        handler: impl Fn(&mut BemNode) + 'static,
    ) -> Self {
        self.render.on_element.insert(element.into(), Rc::new(handler));
        self
    }

    /// Set the init trigger (builder).
    pub fn init_on(mut self, trigger: InitTrigger) -> Self {
        self.behavior.init_on = Some(trigger);
        self
    }

    /// Set the init method (builder).
    pub fn init(
        mut self,
        init: impl Fn(&mut Call<'_>, &dyn Any) -> Option<Box<dyn Any>> + 'static,
    ) -> Self {
        self.behavior.init = Some(Rc::new(init));
        self
    }

    /// Set the on-activate hook for one modifier (builder).
    pub fn on_mod(mut self, m: impl Into<String>, hook: impl Fn(&mut Call<'_>) + 'static) -> Self {
        self.behavior.on_mod.insert(m.into(), Rc::new(hook));
        self
    }

    /// Add a named behavior method (builder).
    pub fn method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&mut Call<'_>, &dyn Any) -> Option<Box<dyn Any>> + 'static,
    ) -> Self {
        self.behavior.methods.insert(name.into(), Rc::new(method));
        self
    }

    /// Merge another declaration into this one, field by field.
    ///
    /// Optional fields: an incoming `Some` wins. Nested maps: key by key,
    /// last write wins, untouched keys retained.
    fn merge(&mut self, incoming: Declaration) {
        if incoming.render.on_block.is_some() {
            self.render.on_block = incoming.render.on_block;
        }
        self.render.on_element.extend(incoming.render.on_element);

        if incoming.behavior.init_on.is_some() {
            self.behavior.init_on = incoming.behavior.init_on;
        }
        if incoming.behavior.init.is_some() {
            self.behavior.init = incoming.behavior.init;
        }
        self.behavior.on_mod.extend(incoming.behavior.on_mod);
        self.behavior.methods.extend(incoming.behavior.methods);
    }
}

impl std::fmt::Debug for Declaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut elements: Vec<&String> = self.render.on_element.keys().collect();
        elements.sort();
        let mut methods: Vec<&String> = self.behavior.methods.keys().collect();
        methods.sort();
        f.debug_struct("Declaration")
            .field("on_block", &self.render.on_block.is_some())
            .field("on_element", &elements)
            .field("init_on", &self.behavior.trigger())
            .field("init", &self.behavior.init.is_some())
            .field("methods", &methods)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Catalog of declarations, keyed by canonical name.
///
/// Exactly one entry exists per canonical name at any time; `declare` merges
/// instead of duplicating.
#[derive(Debug, Default)]
pub struct Registry {
    declarations: HashMap<CanonicalName, Declaration>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration under a canonical name, merging into any
    /// existing entry. Redeclaration is never an error.
    pub fn declare(&mut self, name: impl Into<CanonicalName>, declaration: Declaration) {
        let name = name.into();
        match self.declarations.get_mut(&name) {
            Some(existing) => {
                debug!("merging declaration into existing entry `{name}`");
                existing.merge(declaration);
            }
            None => {
                debug!("new declaration `{name}`");
                self.declarations.insert(name, declaration);
            }
        }
    }

    /// Look up a declaration. Absence is a normal outcome, not an error;
    /// callers treat it as "no customization".
    pub fn lookup(&self, name: &CanonicalName) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    /// All registered canonical names, sorted for deterministic iteration.
    pub fn names(&self) -> Vec<&CanonicalName> {
        let mut names: Vec<&CanonicalName> = self.declarations.keys().collect();
        names.sort();
        names
    }

    /// Number of registered declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::CanonicalName;

    fn name(s: &str) -> CanonicalName {
        CanonicalName::from(s)
    }

    // ── declare / lookup ─────────────────────────────────────────────

    #[test]
    fn lookup_absent_is_none() {
        let registry = Registry::new();
        assert!(registry.lookup(&name("menu")).is_none());
    }

    #[test]
    fn declare_then_lookup() {
        let mut registry = Registry::new();
        registry.declare("menu", Declaration::new().on_block(|_| {}));
        let decl = registry.lookup(&name("menu")).unwrap();
        assert!(decl.render.on_block.is_some());
    }

    #[test]
    fn one_entry_per_canonical_name() {
        let mut registry = Registry::new();
        registry.declare("menu", Declaration::new());
        registry.declare("menu", Declaration::new());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn block_and_mod_are_distinct_entries() {
        let mut registry = Registry::new();
        registry.declare("menu", Declaration::new());
        registry.declare(CanonicalName::with_mod("menu", "open"), Declaration::new());
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup(&name("menu--open")).is_some());
    }

    // ── merge semantics ──────────────────────────────────────────────

    #[test]
    fn merge_keeps_existing_fields() {
        let mut registry = Registry::new();
        registry.declare("menu", Declaration::new().on_block(|_| {}));
        registry.declare("menu", Declaration::new().on_element("item", |_| {}));

        let decl = registry.lookup(&name("menu")).unwrap();
        assert!(decl.render.on_block.is_some());
        assert!(decl.render.on_element.contains_key("item"));
    }

    #[test]
    fn merge_last_write_wins_for_options() {
        let mut registry = Registry::new();
        registry.declare("menu", Declaration::new().init_on(InitTrigger::Load));
        registry.declare("menu", Declaration::new().init_on(InitTrigger::Insert));
        let decl = registry.lookup(&name("menu")).unwrap();
        assert_eq!(decl.behavior.trigger(), InitTrigger::Insert);
    }

    #[test]
    fn merge_does_not_clear_option_with_none() {
        let mut registry = Registry::new();
        registry.declare("menu", Declaration::new().init_on(InitTrigger::Insert));
        registry.declare("menu", Declaration::new().on_block(|_| {}));
        let decl = registry.lookup(&name("menu")).unwrap();
        assert_eq!(decl.behavior.trigger(), InitTrigger::Insert);
    }

    #[test]
    fn merge_nested_maps_key_by_key() {
        use std::cell::Cell;
        use std::rc::Rc;

        let which = Rc::new(Cell::new(0u8));

        let w1 = Rc::clone(&which);
        let w2 = Rc::clone(&which);
        let mut registry = Registry::new();
        registry.declare(
            "menu",
            Declaration::new()
                .on_element("item", move |_| w1.set(1))
                .on_element("title", |_| {}),
        );
        // Overwrites "item", retains "title".
        registry.declare("menu", Declaration::new().on_element("item", move |_| w2.set(2)));

        let decl = registry.lookup(&name("menu")).unwrap();
        assert_eq!(decl.render.on_element.len(), 2);
        let handler = decl.render.on_element.get("item").unwrap();
        handler(&mut crate::tree::BemNode::new());
        assert_eq!(which.get(), 2);
    }

    #[test]
    fn merge_method_maps() {
        let mut registry = Registry::new();
        registry.declare("menu", Declaration::new().method("open", |_, _| None));
        registry.declare("menu", Declaration::new().method("close", |_, _| None));
        let decl = registry.lookup(&name("menu")).unwrap();
        assert_eq!(decl.behavior.methods.len(), 2);
    }

    // ── defaults ─────────────────────────────────────────────────────

    #[test]
    fn default_trigger_is_load() {
        assert_eq!(BehaviorGroup::default().trigger(), InitTrigger::Load);
    }

    #[test]
    fn empty_behavior_group() {
        assert!(BehaviorGroup::default().is_empty());
        let decl = Declaration::new().method("m", |_, _| None);
        assert!(!decl.behavior.is_empty());
    }

    #[test]
    fn names_sorted() {
        let mut registry = Registry::new();
        registry.declare("b", Declaration::new());
        registry.declare("a", Declaration::new());
        let names: Vec<&str> = registry.names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
