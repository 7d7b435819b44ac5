use thiserror::Error;

/// Structural errors raised while building or freezing a resource graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  /// A node with this id was already added.
  #[error("duplicate node id: {node_id}")]
  DuplicateId { node_id: String },

  /// An edge, dependency or deferred reference names a node that does not exist.
  #[error("unknown node '{node_id}' referenced by {referenced_by}")]
  UnknownNode {
    node_id: String,
    referenced_by: String,
  },

  /// The dependency graph contains a cycle through these nodes.
  #[error("cycle detected among nodes: {}", nodes.join(", "))]
  CycleDetected { nodes: Vec<String> },

  /// An earlier edit was rejected, so the graph can no longer be frozen.
  #[error("graph rejected an earlier edit: {0}")]
  Poisoned(Box<GraphError>),
}

/// Errors raised while reading deferred values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  /// The producer has not been recorded in the resolved set yet.
  #[error("unresolved dependency '{producer_id}' needed by {needed_by}")]
  UnresolvedDependency {
    producer_id: String,
    needed_by: String,
  },

  /// The producer completed but did not report the requested attribute.
  #[error("node '{producer_id}' did not report attribute '{attribute_path}'")]
  MissingAttribute {
    producer_id: String,
    attribute_path: String,
  },

  /// The producer's attributes were already recorded for this run.
  #[error("node '{producer_id}' was already recorded as resolved")]
  AlreadyRecorded { producer_id: String },

  /// The plan has no node with this id.
  #[error("plan has no node '{node_id}'")]
  UnknownNode { node_id: String },
}
