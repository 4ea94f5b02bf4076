//! # bemark
//!
//! A declarative UI composition library built on the BEM vocabulary: authors
//! describe interfaces as semantic trees of blocks, elements, and modifiers;
//! named declarations customize how those trees render to HTML markup and
//! what behavior attaches to them once the markup is live.
//!
//! Everything hangs off an explicit [`Context`](context::Context) — the
//! declaration catalog, the lazy-init scheduler, and the behavior runtime are
//! owned state the caller threads through, never ambient globals.
//!
//! ## Core Systems
//!
//! - **[`tree`]** — The author-facing semantic tree: [`Bem`], [`BemNode`],
//!   insertion-ordered attributes
//! - **[`name`]** — Canonical names (`block`, `block--mod`) and class-token
//!   utilities
//! - **[`registry`]** — Declarations: render customizations plus behavior
//!   bundles, merged per canonical name
//! - **[`render`]** — Semantic tree → markup tree conversion with
//!   first-match-wins dispatch and wrapper substitution
//! - **[`html`]** — The markup tree and its string serializer
//! - **[`scheduler`]** — Attach-time init markers for fragments inserted into
//!   a live page
//! - **[`dom`]** — Slotmap-backed document arena and the [`DomHost`] trait
//!   real hosts implement
//! - **[`behavior`]** — Layered behavior instances with `base` delegation
//!   between block and modifier layers
//! - **[`context`]** — The facade tying all of the above together

// Vocabulary and markup
pub mod html;
pub mod name;
pub mod tree;

// Declarations and rendering
pub mod registry;
pub mod render;
pub mod scheduler;

// Live documents and behavior
pub mod behavior;
pub mod dom;

// Facade
pub mod context;

pub use behavior::{Call, Instance, InstanceRef, Params};
pub use context::Context;
pub use dom::{Dom, DomHost, NodeData, NodeId};
pub use html::Html;
pub use registry::{Declaration, InitTrigger, Registry};
pub use tree::{AttrMap, Bem, BemNode};
