//! Precisionmed Graph
//!
//! This crate provides the resource graph that the stack builder fills in and
//! the frozen, ordered plan that is handed to a provisioning executor.
//!
//! Key points:
//! - Nodes are [`ResourceSpec`]s; configuration values may be literal or
//!   [`DeferredValue`]s produced by another node once it is provisioned
//! - Deferred references may point forward; their producers are checked at
//!   [`ResourceGraph::freeze`]
//! - Freezing validates the structure once and yields an [`OrderedPlan`] with a
//!   deterministic linear order and batches of mutually independent nodes
//! - Values are read through a write-once [`ResolvedSet`]; reading a value
//!   before its producer is recorded fails instead of blocking

mod error;
mod graph;
mod plan;
mod resolved;
mod spec;
mod value;

pub use error::{GraphError, ResolveError};
pub use graph::ResourceGraph;
pub use plan::{OrderedPlan, ResolvedResource};
pub use resolved::{Attributes, ResolvedSet};
pub use spec::{NodeHandle, ResourceKind, ResourceSpec};
pub use value::{ConfigValue, DeferredValue, Fragment, Interpolation};
