use precisionmed_graph::ResolveError;
use precisionmed_outputs::OutputError;
use thiserror::Error;

/// Failure reported by a provisioning executor. Opaque to the deployer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProvisionError {
  pub message: String,
}

impl ProvisionError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

#[derive(Debug, Error)]
pub enum DeployError {
  /// A node's configuration could not be resolved.
  #[error("resolution failed: {0}")]
  Resolve(#[from] ResolveError),

  /// The executor reported a failure. Dependent nodes are never attempted.
  #[error("node provisioning failed for '{node_id}': {message}")]
  ProvisioningFailed { node_id: String, message: String },

  #[error("output collection failed: {0}")]
  Outputs(#[from] OutputError),

  #[error("provisioning task failed: {0}")]
  Task(String),

  #[error("deployment cancelled")]
  Cancelled,
}
