use precisionmed_config::ConfigError;
use precisionmed_graph::GraphError;
use precisionmed_outputs::OutputError;
use precisionmed_workflow::ComposeError;
use thiserror::Error;

/// Errors raised while building or freezing a stack.
#[derive(Debug, Error)]
pub enum StackError {
  #[error("configuration error: {0}")]
  Config(#[from] ConfigError),

  #[error("graph error: {0}")]
  Graph(#[from] GraphError),

  #[error("output error: {0}")]
  Output(#[from] OutputError),

  #[error("composition error: {0}")]
  Compose(#[from] ComposeError),

  #[error("failed to render workflow definition: {0}")]
  Definition(#[from] serde_json::Error),
}
