use thiserror::Error;

/// Errors raised while loading or validating a stack configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  /// A field is missing, empty, or malformed.
  #[error("invalid config field '{field}': {message}")]
  InvalidConfig { field: String, message: String },

  /// The configuration document could not be parsed.
  #[error("failed to parse stack config: {0}")]
  Parse(String),
}

impl ConfigError {
  pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
    Self::InvalidConfig {
      field: field.to_string(),
      message: message.into(),
    }
  }
}
