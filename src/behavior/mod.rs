//! Behavior composition runtime.
//!
//! Given a live document node and a base block name, the runtime builds (or
//! retrieves, by stable identity) a composed behavior instance layering the
//! base block and every active modifier, with controlled delegation between
//! layers: each method resolves to its most-recently-layered implementation,
//! and [`Call::base`] walks one layer back per call — chain-of-responsibility
//! standing in for runtime multiple inheritance.

pub mod instance;
pub mod params;
pub mod runtime;

pub use instance::{Instance, INIT_METHOD};
pub use params::{Params, ParamsError, PARAMS_ATTR};
pub use runtime::{Call, InstanceRef, Runtime};
