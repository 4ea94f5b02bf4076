//! The owning facade tying registry, renderer, scheduler, and runtime
//! together.
//!
//! A [`Context`] is explicit shared state: everything that used to be
//! ambient — the declaration catalog, the pending attach records, the
//! instance cache — lives in one value the caller owns and threads through.
//! Two contexts never interact; tests get isolation for free by creating a
//! fresh one.

use std::any::Any;

use log::debug;

use crate::behavior::{runtime, InstanceRef, Runtime};
use crate::dom::{DomHost, NodeId};
use crate::html::{to_html, Html};
use crate::name::{base_block, CanonicalName};
use crate::registry::{Declaration, InitTrigger, Registry};
use crate::render::{render_collecting, DeferredInit};
use crate::scheduler::Scheduler;
use crate::tree::Bem;

/// Declaration catalog, lazy-init scheduler, and behavior runtime under one
/// roof.
#[derive(Default)]
pub struct Context {
    registry: Registry,
    scheduler: Scheduler,
    runtime: Runtime,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration under a canonical name (`block` or
    /// `block--mod`). Redeclaring merges; see [`Registry::declare`].
    pub fn declare(&mut self, name: impl Into<CanonicalName>, decl: Declaration) {
        self.registry.declare(name, decl);
    }

    /// Read access to the declaration catalog.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Render a semantic tree to a markup tree, with no attach bookkeeping.
    pub fn render(&self, bem: impl Into<Bem>) -> Html {
        crate::render::render(&self.registry, bem)
    }

    /// Render a semantic tree straight to a markup string.
    pub fn render_html(&self, bem: impl Into<Bem>) -> String {
        crate::render::render_html(&self.registry, bem)
    }

    /// Render a fragment destined for insertion into an already-active page.
    ///
    /// When the fragment contains blocks whose init trigger is lazy, a hidden
    /// marker element is appended and the returned token identifies the
    /// pending record; the hosting environment reports it back through
    /// [`fragment_attached`](Self::fragment_attached) once the fragment is
    /// live. Fragments without lazy blocks come back unmodified with no
    /// token.
    pub fn build_fragment(&mut self, bem: impl Into<Bem>) -> (Html, Option<String>) {
        let mut deferred = DeferredInit::new();
        let html = render_collecting(&self.registry, bem, &mut deferred);
        if deferred.is_empty() {
            return (html, None);
        }
        let (html, token) = self.scheduler.schedule(html, deferred);
        (html, Some(token))
    }

    /// [`build_fragment`](Self::build_fragment), serialized to a markup
    /// string.
    pub fn build(&mut self, bem: impl Into<Bem>) -> String {
        self.build_with_token(bem).0
    }

    /// [`build`](Self::build), also returning the marker token when one was
    /// issued.
    pub fn build_with_token(&mut self, bem: impl Into<Bem>) -> (String, Option<String>) {
        let (html, token) = self.build_fragment(bem);
        (to_html(&html), token)
    }

    /// Build a fragment without attach bookkeeping: no marker, no pending
    /// record. The caller takes over initialization of any lazy blocks via
    /// [`init`](Self::init).
    pub fn build_manual(&self, bem: impl Into<Bem>) -> String {
        self.render_html(bem)
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    /// The page-load sweep: initialize every eagerly triggered declared block
    /// found under `container`. Blocks attached to the document after the
    /// sweep are not picked up; they go through the fragment path or an
    /// explicit [`init`](Self::init).
    pub fn init_on_load(&mut self, host: &mut dyn DomHost, container: NodeId) {
        let blocks: DeferredInit = self
            .registry
            .names()
            .into_iter()
            .filter(|name| {
                self.registry.lookup(name).is_some_and(|d| {
                    !d.behavior.is_empty() && d.behavior.trigger() == InitTrigger::Load
                })
            })
            .map(|name| base_block(name.as_str()).to_owned())
            .collect();
        debug!("load sweep over {} block(s)", blocks.len());
        self.runtime.init(&self.registry, host, blocks, container);
    }

    /// Initialize exactly the given blocks under `container`, regardless of
    /// their declared trigger.
    pub fn init<I, S>(&mut self, host: &mut dyn DomHost, blocks: I, container: NodeId)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.runtime.init(&self.registry, host, blocks, container);
    }

    /// Report that a built fragment is now live under `container`. Fires the
    /// fragment's deferred init exactly once; unknown or already-fired tokens
    /// are ignored.
    pub fn fragment_attached(&mut self, host: &mut dyn DomHost, token: &str, container: NodeId) {
        let Some(blocks) = self.scheduler.take_pending(token) else {
            return;
        };
        debug!("fragment `{token}` attached; initializing {blocks:?}");
        self.runtime.init(&self.registry, host, blocks, container);
    }

    // -----------------------------------------------------------------------
    // Behavior access
    // -----------------------------------------------------------------------

    /// The composed instance for a node and block, created on first need.
    pub fn instance(&mut self, host: &mut dyn DomHost, node: NodeId, block: &str) -> InstanceRef {
        self.runtime.get_or_create(&self.registry, host, node, block)
    }

    /// Invoke a composed method on an instance. `None` when no layer defines
    /// the method.
    pub fn call(
        &self,
        host: &mut dyn DomHost,
        instance: &InstanceRef,
        method: &str,
        args: &dyn Any,
    ) -> Option<Box<dyn Any>> {
        self.runtime.call(&self.registry, host, instance, method, args)
    }

    /// Activate a modifier on an instance. Idempotent; see
    /// [`Call::set_mod`](crate::behavior::Call::set_mod).
    pub fn set_mod(&self, host: &mut dyn DomHost, instance: &InstanceRef, m: &str) {
        runtime::set_mod(&self.registry, host, instance, m);
    }

    /// Whether the instance's node carries the modifier's marker class.
    pub fn has_mod(&self, host: &dyn DomHost, instance: &InstanceRef, m: &str) -> bool {
        runtime::has_mod(host, instance, m)
    }

    /// Deactivate a modifier on an instance. No-op if inactive.
    pub fn remove_mod(&self, host: &mut dyn DomHost, instance: &InstanceRef, m: &str) {
        runtime::remove_mod(host, instance, m);
    }

    /// Number of live behavior instances.
    pub fn instance_count(&self) -> usize {
        self.runtime.instance_count()
    }

    /// Number of built fragments still awaiting attachment.
    pub fn pending_count(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Drop all instances and pending attach records. Declarations are kept;
    /// the document itself is untouched.
    pub fn reset(&mut self) {
        self.runtime.clear();
        self.scheduler.clear();
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("declarations", &self.registry.len())
            .field("instances", &self.runtime.instance_count())
            .field("pending", &self.scheduler.pending_count())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dom::{Dom, NodeData};
    use crate::scheduler::MARKER_CLASS;
    use crate::tree::BemNode;

    // ── Rendering facade ─────────────────────────────────────────────

    #[test]
    fn declare_then_render() {
        let mut ctx = Context::new();
        ctx.declare(
            "badge",
            Declaration::new().on_block(|node| node.tag = Some("span".to_owned())),
        );
        assert_eq!(
            ctx.render_html(BemNode::block("badge")),
            "<span class=\"badge\"></span>"
        );
    }

    #[test]
    fn build_without_lazy_blocks_is_plain() {
        let mut ctx = Context::new();
        let (markup, token) = ctx.build_with_token(BemNode::block("b"));
        assert_eq!(markup, "<div class=\"b\"></div>");
        assert_eq!(token, None);
        assert_eq!(ctx.pending_count(), 0);
    }

    #[test]
    fn build_with_lazy_block_appends_marker() {
        let mut ctx = Context::new();
        ctx.declare("widget", Declaration::new().init_on(InitTrigger::Insert));

        let (markup, token) = ctx.build_with_token(BemNode::block("widget"));
        let token = token.unwrap();
        assert!(markup.contains(MARKER_CLASS));
        assert!(markup.contains(&token));
        assert_eq!(ctx.pending_count(), 1);
    }

    #[test]
    fn build_manual_never_schedules() {
        let mut ctx = Context::new();
        ctx.declare("widget", Declaration::new().init_on(InitTrigger::Insert));
        let markup = ctx.build_manual(BemNode::block("widget"));
        assert_eq!(markup, "<div class=\"widget\"></div>");
        assert_eq!(ctx.pending_count(), 0);
    }

    // ── Fragment attachment ──────────────────────────────────────────

    fn attach(dom: &mut Dom, parent: crate::dom::NodeId, html: &Html) {
        dom.attach_html(parent, html);
    }

    #[test]
    fn fragment_attached_inits_lazy_block() {
        let mut ctx = Context::new();
        ctx.declare("widget", Declaration::new().init_on(InitTrigger::Insert));

        let (fragment, token) = ctx.build_fragment(BemNode::block("widget"));
        let token = token.unwrap();

        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        attach(&mut dom, root, &fragment);

        ctx.fragment_attached(&mut dom, &token, root);
        assert_eq!(ctx.instance_count(), 1);

        let node = dom.query_class(root, "widget")[0];
        assert!(dom.get(node).unwrap().has_class("widget--inited"));
    }

    #[test]
    fn fragment_attached_fires_once() {
        let mut ctx = Context::new();
        ctx.declare("widget", Declaration::new().init_on(InitTrigger::Insert));

        let (fragment, token) = ctx.build_fragment(BemNode::block("widget"));
        let token = token.unwrap();

        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        attach(&mut dom, root, &fragment);

        ctx.fragment_attached(&mut dom, &token, root);
        ctx.fragment_attached(&mut dom, &token, root);
        assert_eq!(ctx.instance_count(), 1);
        assert_eq!(ctx.pending_count(), 0);
    }

    #[test]
    fn unknown_token_is_ignored() {
        let mut ctx = Context::new();
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        ctx.fragment_attached(&mut dom, "init-42", root);
        assert_eq!(ctx.instance_count(), 0);
    }

    // ── Load sweep ───────────────────────────────────────────────────

    #[test]
    fn load_sweep_inits_eager_blocks_only() {
        let mut ctx = Context::new();
        ctx.declare("eager", Declaration::new().init(|_, _| None));
        ctx.declare(
            "lazy",
            Declaration::new().init_on(InitTrigger::Insert).init(|_, _| None),
        );

        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        let e = dom.insert_child(root, NodeData::new("div").with_class("eager"));
        let l = dom.insert_child(root, NodeData::new("div").with_class("lazy"));

        ctx.init_on_load(&mut dom, root);
        assert!(dom.get(e).unwrap().has_class("eager--inited"));
        assert!(!dom.get(l).unwrap().has_class("lazy--inited"));
        assert_eq!(ctx.instance_count(), 1);
    }

    #[test]
    fn load_sweep_covers_mod_only_declarations() {
        let mut ctx = Context::new();
        // Behavior declared only on the block+modifier pair still makes the
        // base block a sweep target.
        ctx.declare("menu--live", Declaration::new().init(|_, _| None));

        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        let node = dom.insert_child(root, NodeData::new("div"));
        dom.get_mut(node).unwrap().set_class_attr("menu menu--live");

        ctx.init_on_load(&mut dom, root);
        assert!(dom.get(node).unwrap().has_class("menu--inited"));
    }

    #[test]
    fn load_sweep_skips_render_only_declarations() {
        let mut ctx = Context::new();
        ctx.declare("pretty", Declaration::new().on_block(|_| {}));

        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        dom.insert_child(root, NodeData::new("div").with_class("pretty"));

        ctx.init_on_load(&mut dom, root);
        assert_eq!(ctx.instance_count(), 0);
    }

    #[test]
    fn sweep_misses_block_added_after_sweep() {
        let mut ctx = Context::new();
        ctx.declare("b", Declaration::new().init(|_, _| None));

        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        ctx.init_on_load(&mut dom, root);

        // Attached after the sweep: no instance until explicitly initialized.
        let late = dom.insert_child(root, NodeData::new("div").with_class("b"));
        assert_eq!(ctx.instance_count(), 0);

        ctx.init(&mut dom, ["b"], root);
        assert!(dom.get(late).unwrap().has_class("b--inited"));
    }

    // ── Behavior facade ──────────────────────────────────────────────

    #[test]
    fn call_and_mods_through_context() {
        let mut ctx = Context::new();
        ctx.declare(
            "b",
            Declaration::new().method("echo", |_, args| {
                args.downcast_ref::<i32>()
                    .map(|n| Box::new(*n) as Box<dyn Any>)
            }),
        );

        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        let node = dom.insert_child(root, NodeData::new("div").with_class("b"));

        let inst = ctx.instance(&mut dom, node, "b");
        let out = ctx.call(&mut dom, &inst, "echo", &7i32);
        assert_eq!(*out.unwrap().downcast::<i32>().unwrap(), 7);

        ctx.set_mod(&mut dom, &inst, "open");
        assert!(ctx.has_mod(&dom, &inst, "open"));
        ctx.remove_mod(&mut dom, &inst, "open");
        assert!(!ctx.has_mod(&dom, &inst, "open"));
    }

    #[test]
    fn first_persisted_block_id_is_one() {
        let mut ctx = Context::new();
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        let node = dom.insert_child(root, NodeData::new("div").with_class("b"));

        ctx.instance(&mut dom, node, "b");
        let blob = dom.attr(node, crate::behavior::PARAMS_ATTR).unwrap();
        let params = crate::behavior::Params::decode(&blob).unwrap();
        assert_eq!(params.block_id, Some(1));
    }

    #[test]
    fn reset_keeps_the_allocation_base() {
        let mut ctx = Context::new();
        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        let node = dom.insert_child(root, NodeData::new("div").with_class("b"));

        let before = ctx.instance(&mut dom, node, "b").borrow().block_id();
        ctx.reset();

        let other = dom.insert_child(root, NodeData::new("div").with_class("b"));
        let after = ctx.instance(&mut dom, other, "b").borrow().block_id();
        assert_eq!(before, after);
    }

    #[test]
    fn contexts_are_isolated() {
        let mut a = Context::new();
        let b = Context::new();
        a.declare(
            "badge",
            Declaration::new().on_block(|node| node.tag = Some("b".to_owned())),
        );
        assert_eq!(a.render_html(BemNode::block("badge")), "<b class=\"badge\"></b>");
        assert_eq!(b.render_html(BemNode::block("badge")), "<div class=\"badge\"></div>");
    }

    #[test]
    fn reset_keeps_declarations() {
        let mut ctx = Context::new();
        ctx.declare("b", Declaration::new().init(|_, _| None));

        let mut dom = Dom::new();
        let root = dom.insert(NodeData::new("body"));
        dom.insert_child(root, NodeData::new("div").with_class("b"));
        ctx.init_on_load(&mut dom, root);
        assert_eq!(ctx.instance_count(), 1);

        ctx.reset();
        assert_eq!(ctx.instance_count(), 0);
        assert_eq!(ctx.registry().len(), 1);
    }
}
