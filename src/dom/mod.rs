//! The document side of the library: the [`DomHost`] collaborator interface
//! the behavior runtime drives, and a slotmap-backed in-memory [`Dom`]
//! implementing it for tests and hosts without a document model of their own.

pub mod host;
pub mod node;
pub mod tree;

pub use host::DomHost;
pub use node::{NodeData, NodeId};
pub use tree::Dom;
