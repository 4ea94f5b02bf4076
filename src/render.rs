//! Semantic tree → markup tree conversion.
//!
//! The renderer walks a [`Bem`] tree, consulting the [`Registry`] at each
//! block/element node. Dispatch is first-match-wins over the declaration
//! search order `[block--mod..., block]` (most specific modifier first, base
//! block last): exactly one handler runs per node, never a merge of handlers.
//! A handler may replace the node with a wrapper, whose rendering entirely
//! takes the node's place in the output.
//!
//! Rendering is pure with respect to everything but the registry and the
//! optional deferred-init set it fills for the lazy-init scheduler.

use std::collections::BTreeSet;

use log::{debug, trace};

use crate::html::{Html, HtmlElement, DEFAULT_TAG};
use crate::name::{element_class, mod_class, search_order, CanonicalName};
use crate::registry::{InitTrigger, Registry};
use crate::tree::{Bem, BemNode};

/// Block names that need deferred initialization once the rendered fragment
/// is attached. Ordered for deterministic marker content and init order.
pub type DeferredInit = BTreeSet<String>;

/// The owning block scope: the nearest ancestor structured node that declared
/// `block`, with its modifiers. Element nodes resolve against this.
#[derive(Debug, Clone)]
struct Scope {
    block: String,
    mods: Vec<String>,
}

/// Render a semantic tree to a markup tree.
pub fn render(registry: &Registry, bem: impl Into<Bem>) -> Html {
    let mut renderer = Renderer {
        registry,
        deferred: None,
    };
    renderer.render_value(bem.into(), None)
}

/// Render a semantic tree destined for insertion into an already-active page,
/// collecting into `deferred` the blocks whose behavior trigger is lazy.
pub fn render_collecting(
    registry: &Registry,
    bem: impl Into<Bem>,
    deferred: &mut DeferredInit,
) -> Html {
    let mut renderer = Renderer {
        registry,
        deferred: Some(deferred),
    };
    renderer.render_value(bem.into(), None)
}

/// Render a semantic tree straight to a markup string.
pub fn render_html(registry: &Registry, bem: impl Into<Bem>) -> String {
    crate::html::to_html(&render(registry, bem))
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

struct Renderer<'a> {
    registry: &'a Registry,
    deferred: Option<&'a mut DeferredInit>,
}

impl Renderer<'_> {
    fn render_value(&mut self, bem: Bem, scope: Option<&Scope>) -> Html {
        match bem {
            Bem::Empty => Html::Empty,
            Bem::Text(text) => Html::Text(text),
            Bem::Raw(html) => html,
            Bem::Seq(items) => Html::Seq(
                items
                    .into_iter()
                    .map(|child| self.render_value(child, scope))
                    .collect(),
            ),
            Bem::Node(node) => self.render_node(*node, scope),
        }
    }

    fn render_node(&mut self, mut node: BemNode, scope: Option<&Scope>) -> Html {
        if let Some(block) = node.block.clone() {
            let mods = node.mods.clone();
            let order = search_order(&block, &mods);

            self.record_deferred(&block, &order);
            self.dispatch_block(&mut node, &order);

            node.attrs.append_class(&block);
            for m in &mods {
                node.attrs.append_class(&mod_class(&block, m));
            }

            let own_scope = Scope { block, mods };
            if let Some(wrapper) = node.wrapper.take() {
                return self.render_wrapper(wrapper, node, Some(&own_scope), scope);
            }
            return self.finalize(node, Some(&own_scope));
        }

        if let Some(element) = node.element.clone() {
            self.customize_element(&mut node, &element, scope);
        }

        if let Some(wrapper) = node.wrapper.take() {
            return self.render_wrapper(wrapper, node, scope, scope);
        }
        self.finalize(node, scope)
    }

    /// Dispatch the first on-block handler in search order. Later candidates
    /// never run.
    fn dispatch_block(&mut self, node: &mut BemNode, order: &[CanonicalName]) {
        for name in order {
            if let Some(declaration) = self.registry.lookup(name) {
                if let Some(handler) = declaration.render.on_block.clone() {
                    trace!("on-block handler from `{name}`");
                    handler(node);
                    return;
                }
            }
        }
    }

    /// Dispatch the first on-element handler in the owning scope's search
    /// order, then append the `block__element` class.
    fn customize_element(&mut self, node: &mut BemNode, element: &str, scope: Option<&Scope>) {
        let Some(scope) = scope else {
            debug!("element `{element}` has no owning block scope; skipping customization");
            return;
        };

        let order = search_order(&scope.block, &scope.mods);
        for name in &order {
            if let Some(declaration) = self.registry.lookup(name) {
                if let Some(handler) = declaration.render.on_element.get(element).cloned() {
                    trace!("on-element handler for `{element}` from `{name}`");
                    handler(node);
                    break;
                }
            }
        }

        // Appended whether or not a handler matched.
        node.attrs.append_class(&element_class(&scope.block, element));
    }

    /// Record the block for deferred init if any declaration in its search
    /// order carries a lazy trigger.
    fn record_deferred(&mut self, block: &str, order: &[CanonicalName]) {
        let Some(deferred) = self.deferred.as_deref_mut() else {
            return;
        };
        let lazy = order.iter().any(|name| {
            self.registry
                .lookup(name)
                .is_some_and(|d| d.behavior.trigger() == InitTrigger::Insert)
        });
        if lazy {
            debug!("block `{block}` deferred to attach-time init");
            deferred.insert(block.to_owned());
        }
    }

    /// The wrapper's rendering entirely replaces the node's. A structured
    /// wrapper takes the node's finished rendering as its content; any other
    /// wrapper value discards the node (an empty sequence renders to nothing,
    /// the documented conditional-removal idiom).
    fn render_wrapper(
        &mut self,
        wrapper: Bem,
        node: BemNode,
        node_scope: Option<&Scope>,
        parent_scope: Option<&Scope>,
    ) -> Html {
        match wrapper {
            Bem::Node(mut wrapper_node) => {
                let inner = self.finalize(node, node_scope);
                wrapper_node.content = Some(Bem::Raw(inner));
                self.render_value(Bem::Node(wrapper_node), parent_scope)
            }
            other => self.render_value(other, parent_scope),
        }
    }

    /// Convert a fully customized node to markup, rendering its content under
    /// the given owning scope.
    fn finalize(&mut self, node: BemNode, content_scope: Option<&Scope>) -> Html {
        let tag = node.tag.unwrap_or_else(|| DEFAULT_TAG.to_owned());
        let content = match node.content {
            Some(content) => self.render_value(content, content_scope),
            None => Html::Empty,
        };
        Html::Element(HtmlElement {
            tag,
            attrs: node.attrs,
            content: Box::new(content),
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
