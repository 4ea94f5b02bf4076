//! A composed behavior instance: ordered layers and per-method chains.
//!
//! An instance is bound to exactly one document node and one base block. Its
//! layer list starts with the block and grows with each active modifier, in
//! the order their marker classes appear on the node. Every method name maps
//! to an ordered chain of implementations, earliest (block) to latest (last
//! modifier); the live method is the chain's last entry and each entry can
//! delegate one step back.

use std::collections::HashMap;

use crate::dom::NodeId;
use crate::name::CanonicalName;
use crate::registry::{BehaviorGroup, Hook, Method};

/// Reserved chain name for the composed initialization method.
pub const INIT_METHOD: &str = "init";

/// One layer's contribution, tagged with the layer that supplied it so a
/// layer can be popped out again symmetrically.
#[derive(Clone)]
struct Contribution<T> {
    layer: CanonicalName,
    f: T,
}

/// A behavior instance composed from a base block and its active modifiers.
pub struct Instance {
    node: NodeId,
    block: String,
    block_id: u64,
    layers: Vec<CanonicalName>,
    chains: HashMap<String, Vec<Contribution<Method>>>,
    hooks: HashMap<String, Vec<Contribution<Hook>>>,
}

impl Instance {
    /// An instance with no layers yet. The runtime pushes the block layer and
    /// one layer per active modifier immediately after.
    pub(crate) fn new(node: NodeId, block: impl Into<String>, block_id: u64) -> Self {
        Self {
            node,
            block: block.into(),
            block_id,
            layers: Vec::new(),
            chains: HashMap::new(),
            hooks: HashMap::new(),
        }
    }

    /// The document node this instance is bound to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The base block name.
    pub fn block(&self) -> &str {
        &self.block
    }

    /// The persisted stable identifier.
    pub fn block_id(&self) -> u64 {
        self.block_id
    }

    /// Active layers, earliest first.
    pub fn layers(&self) -> &[CanonicalName] {
        &self.layers
    }

    /// Whether the given layer is active.
    pub fn has_layer(&self, layer: &CanonicalName) -> bool {
        self.layers.contains(layer)
    }

    /// Push a layer on top of the composition. The layer is recorded even
    /// when it carries no declared behavior, so the layer list always mirrors
    /// the node's marker classes.
    pub(crate) fn push_layer(&mut self, layer: CanonicalName, group: Option<&BehaviorGroup>) {
        if self.has_layer(&layer) {
            return;
        }
        if let Some(group) = group {
            if let Some(init) = &group.init {
                self.chains
                    .entry(INIT_METHOD.to_owned())
                    .or_default()
                    .push(Contribution {
                        layer: layer.clone(),
                        f: init.clone(),
                    });
            }
            for (method, f) in &group.methods {
                self.chains
                    .entry(method.clone())
                    .or_default()
                    .push(Contribution {
                        layer: layer.clone(),
                        f: f.clone(),
                    });
            }
            for (m, hook) in &group.on_mod {
                self.hooks.entry(m.clone()).or_default().push(Contribution {
                    layer: layer.clone(),
                    f: hook.clone(),
                });
            }
        }
        self.layers.push(layer);
    }

    /// Pop a layer's contributions back out of every chain and hook list.
    pub(crate) fn pop_layer(&mut self, layer: &CanonicalName) {
        self.layers.retain(|l| l != layer);
        self.chains.retain(|_, chain| {
            chain.retain(|c| c.layer != *layer);
            !chain.is_empty()
        });
        self.hooks.retain(|_, hooks| {
            hooks.retain(|c| c.layer != *layer);
            !hooks.is_empty()
        });
    }

    /// The implementation chain for a method, earliest to latest. `None` when
    /// no layer defines the method.
    pub fn chain(&self, method: &str) -> Option<Vec<Method>> {
        self.chains
            .get(method)
            .map(|chain| chain.iter().map(|c| c.f.clone()).collect())
    }

    /// The composed on-activate hook for a modifier: the latest layer's wins.
    pub fn hook(&self, m: &str) -> Option<Hook> {
        self.hooks
            .get(m)
            .and_then(|hooks| hooks.last())
            .map(|c| c.f.clone())
    }

    /// All composed method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.chains.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("block", &self.block)
            .field("block_id", &self.block_id)
            .field("layers", &self.layers)
            .field("methods", &self.method_names())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
