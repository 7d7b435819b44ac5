use precisionmed_graph::ResolveError;
use thiserror::Error;

/// Errors raised while registering or collecting outputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
  #[error("output '{name}' is already registered")]
  DuplicateOutput { name: String },

  #[error("'{name}' is not a stack output")]
  UnknownOutput { name: String },

  /// Mandatory outputs were never registered.
  #[error("missing stack outputs: {}", names.join(", "))]
  MissingOutputs { names: Vec<String> },

  #[error("output '{name}' cannot be collected: {source}")]
  Unresolved {
    name: String,
    #[source]
    source: ResolveError,
  },
}
