//! Instance cache, delegation calls, and modifier state transitions.
//!
//! [`Runtime`] owns the instance cache and the monotonic block-id counter.
//! Instances are found via the identifier persisted in the node's parameter
//! blob, so re-deriving the instance for the same node and block always
//! returns the same object.
//!
//! Method invocations run through [`Call`], which carries the method's
//! implementation chain and a cursor: `base` re-enters the chain one layer
//! earlier with the cursor moved back, so nested `base` calls keep walking
//! toward the block layer. `base` at the block layer is a no-op.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::dom::{DomHost, NodeId};
use crate::name::{add_token, has_token, mod_class, mods_in_class, remove_token, CanonicalName};
use crate::registry::{Method, Registry};

use super::instance::{Instance, INIT_METHOD};
use super::params::{Params, PARAMS_ATTR};

/// Synthetic modifier set once an instance has run its composed init.
pub const INITED_MOD: &str = "inited";

/// Shared handle to a composed instance. Identity-stable: compare with
/// `Rc::ptr_eq`.
pub type InstanceRef = Rc<RefCell<Instance>>;

// ---------------------------------------------------------------------------
// Call
// ---------------------------------------------------------------------------

/// The delegation context handed to behavior methods and hooks.
pub struct Call<'a> {
    registry: &'a Registry,
    host: &'a mut dyn DomHost,
    instance: InstanceRef,
    chain: &'a [Method],
    cursor: usize,
}

impl<'a> Call<'a> {
    /// The node this instance is bound to.
    pub fn node(&self) -> NodeId {
        self.instance.borrow().node()
    }

    /// The base block name.
    pub fn block(&self) -> String {
        self.instance.borrow().block().to_owned()
    }

    /// The document collaborator, for direct reads and writes.
    pub fn host(&mut self) -> &mut dyn DomHost {
        &mut *self.host
    }

    /// Delegate to the implementation this layer overrides: the chain entry
    /// one position earlier. Calling `base` from the earliest (block) layer
    /// is a no-op returning `None`.
    pub fn base(&mut self, args: &dyn Any) -> Option<Box<dyn Any>> {
        if self.cursor == 0 {
            return None;
        }
        let instance = Rc::clone(&self.instance);
        dispatch(
            self.registry,
            &mut *self.host,
            &instance,
            self.chain,
            self.cursor - 1,
            args,
        )
    }

    /// Invoke another composed method on the same instance, entering at its
    /// topmost layer.
    pub fn invoke(&mut self, method: &str, args: &dyn Any) -> Option<Box<dyn Any>> {
        let chain = self.instance.borrow().chain(method)?;
        if chain.is_empty() {
            return None;
        }
        let instance = Rc::clone(&self.instance);
        let cursor = chain.len() - 1;
        dispatch(self.registry, &mut *self.host, &instance, &chain, cursor, args)
    }

    /// Activate a modifier on this instance. Idempotent.
    pub fn set_mod(&mut self, m: &str) {
        let instance = Rc::clone(&self.instance);
        set_mod(self.registry, &mut *self.host, &instance, m);
    }

    /// Whether the node currently carries the modifier's marker class.
    pub fn has_mod(&self, m: &str) -> bool {
        has_mod(&*self.host, &self.instance, m)
    }

    /// Deactivate a modifier on this instance. No-op if inactive.
    pub fn remove_mod(&mut self, m: &str) {
        let instance = Rc::clone(&self.instance);
        remove_mod(&mut *self.host, &instance, m);
    }
}

/// Run one chain entry under a fresh delegation context.
fn dispatch(
    registry: &Registry,
    host: &mut dyn DomHost,
    instance: &InstanceRef,
    chain: &[Method],
    cursor: usize,
    args: &dyn Any,
) -> Option<Box<dyn Any>> {
    let f = chain[cursor].clone();
    let mut call = Call {
        registry,
        host,
        instance: Rc::clone(instance),
        chain,
        cursor,
    };
    f(&mut call, args)
}

// ---------------------------------------------------------------------------
// Modifier state transitions
// ---------------------------------------------------------------------------

/// Activate a modifier: layer its behavior group on top of the composition,
/// fire the composed on-activate hook, then add the marker class. No-op if
/// the exact marker token is already present.
pub(crate) fn set_mod(
    registry: &Registry,
    host: &mut dyn DomHost,
    instance: &InstanceRef,
    m: &str,
) {
    let (node, block) = {
        let inst = instance.borrow();
        (inst.node(), inst.block().to_owned())
    };
    let marker = mod_class(&block, m);
    if has_token(&host.class_attr(node), &marker) {
        return;
    }

    let layer = CanonicalName::with_mod(&block, m);
    {
        let mut inst = instance.borrow_mut();
        let group = registry.lookup(&layer).map(|d| &d.behavior);
        inst.push_layer(layer, group);
    }

    // Hook first, marker class after: the hook observes the pre-activation
    // class state.
    let hook = instance.borrow().hook(m);
    if let Some(hook) = hook {
        let mut call = Call {
            registry,
            host,
            instance: Rc::clone(instance),
            chain: &[],
            cursor: 0,
        };
        hook(&mut call);
    }

    let class_now = host.class_attr(node);
    host.set_class_attr(node, &add_token(&class_now, &marker));
}

/// Exact-token membership test for a modifier's marker class.
pub(crate) fn has_mod(host: &dyn DomHost, instance: &InstanceRef, m: &str) -> bool {
    let inst = instance.borrow();
    let marker = mod_class(inst.block(), m);
    has_token(&host.class_attr(inst.node()), &marker)
}

/// Symmetric teardown: pop the modifier's layer contributions and remove the
/// marker class. No-op if the modifier is not active.
pub(crate) fn remove_mod(host: &mut dyn DomHost, instance: &InstanceRef, m: &str) {
    let (node, block) = {
        let inst = instance.borrow();
        (inst.node(), inst.block().to_owned())
    };
    let marker = mod_class(&block, m);
    let class = host.class_attr(node);
    if !has_token(&class, &marker) {
        return;
    }
    instance
        .borrow_mut()
        .pop_layer(&CanonicalName::with_mod(&block, m));
    host.set_class_attr(node, &remove_token(&class, &marker));
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Instance cache plus the monotonic block-id allocator.
pub struct Runtime {
    instances: HashMap<(u64, String), InstanceRef>,
    next_block_id: u64,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            instances: HashMap::new(),
            next_block_id: 1,
        }
    }

    /// Initialize every element under `container` carrying any of the given
    /// blocks' marker classes.
    pub fn init<I, S>(
        &mut self,
        registry: &Registry,
        host: &mut dyn DomHost,
        blocks: I,
        container: NodeId,
    ) where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for block in blocks {
            let block = block.as_ref();
            let nodes = host.query_class(container, block);
            debug!("init `{block}`: {} node(s)", nodes.len());
            for node in nodes {
                self.get_or_create(registry, host, node, block);
            }
        }
    }

    /// Obtain the instance for a node+block, creating and initializing it on
    /// first need. The stable identifier persisted in the node's parameter
    /// blob makes repeated lookups return the same instance.
    pub fn get_or_create(
        &mut self,
        registry: &Registry,
        host: &mut dyn DomHost,
        node: NodeId,
        block: &str,
    ) -> InstanceRef {
        let raw = host.attr(node, PARAMS_ATTR);
        let mut params = Params::decode_lossy(raw.as_deref());

        let block_id = match params.block_id {
            Some(id) => {
                // Never hand out an id that a restored blob already claims.
                self.next_block_id = self.next_block_id.max(id + 1);
                id
            }
            None => {
                let id = self.next_block_id;
                self.next_block_id += 1;
                params.block_id = Some(id);
                host.set_attr(node, PARAMS_ATTR, &params.encode());
                id
            }
        };

        let key = (block_id, block.to_owned());
        if let Some(existing) = self.instances.get(&key) {
            return Rc::clone(existing);
        }

        debug!("new instance for block `{block}` (id {block_id})");
        let instance = Rc::new(RefCell::new(self.compose(registry, host, node, block, block_id)));
        self.instances.insert(key, Rc::clone(&instance));

        // Run the composed init once, then mark the synthetic inited state
        // through the normal activation path.
        let init_chain = instance.borrow().chain(INIT_METHOD);
        if let Some(chain) = init_chain {
            if !chain.is_empty() {
                dispatch(registry, host, &instance, &chain, chain.len() - 1, &());
            }
        }
        set_mod(registry, host, &instance, INITED_MOD);

        instance
    }

    /// Build the layered composition from the node's marker classes.
    fn compose(
        &self,
        registry: &Registry,
        host: &dyn DomHost,
        node: NodeId,
        block: &str,
        block_id: u64,
    ) -> Instance {
        let class = host.class_attr(node);
        let mut instance = Instance::new(node, block, block_id);

        let base = CanonicalName::block(block);
        instance.push_layer(base.clone(), registry.lookup(&base).map(|d| &d.behavior));

        for m in mods_in_class(&class, block) {
            let layer = CanonicalName::with_mod(block, &m);
            let group = registry.lookup(&layer).map(|d| &d.behavior);
            instance.push_layer(layer, group);
        }
        instance
    }

    /// Invoke a composed method on an instance, entering at its topmost
    /// layer. `None` when no layer defines the method.
    pub fn call(
        &self,
        registry: &Registry,
        host: &mut dyn DomHost,
        instance: &InstanceRef,
        method: &str,
        args: &dyn Any,
    ) -> Option<Box<dyn Any>> {
        let chain = instance.borrow().chain(method)?;
        if chain.is_empty() {
            return None;
        }
        dispatch(registry, host, instance, &chain, chain.len() - 1, args)
    }

    /// Number of live instances.
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Drop all instances and reset the id counter.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.next_block_id = 1;
    }
}

// ===========================================================================
// Tests
// ===========================================================================
