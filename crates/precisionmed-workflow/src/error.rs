use thiserror::Error;

/// Errors raised while composing optional features.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
  /// The feature was already decided; decisions are never re-evaluated.
  #[error("optional feature '{feature}' was already decided")]
  AlreadyDecided { feature: String },
}
