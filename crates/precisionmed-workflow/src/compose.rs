use serde::Serialize;
use tracing::info;

use crate::error::ComposeError;

/// Build either the real node or its placeholder.
///
/// Exactly one of the builders runs. When `present` is false, `build_real` is
/// never invoked.
pub fn compose_optional<T>(
  present: bool,
  build_real: impl FnOnce() -> T,
  build_placeholder: impl FnOnce() -> T,
) -> T {
  if present {
    build_real()
  } else {
    build_placeholder()
  }
}

/// Outcome of one optional-feature decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureDecision {
  pub feature: String,
  pub included: bool,
}

/// Single decision point for every optional feature of a deployment.
///
/// Each feature is decided once at graph-construction time; asking again
/// is an error rather than a re-evaluation.
#[derive(Debug, Default)]
pub struct ConditionalComposer {
  decisions: Vec<FeatureDecision>,
}

impl ConditionalComposer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Decide `feature` and build the matching node.
  pub fn compose<T>(
    &mut self,
    feature: &str,
    present: bool,
    build_real: impl FnOnce() -> T,
    build_placeholder: impl FnOnce() -> T,
  ) -> Result<T, ComposeError> {
    self.record(feature, present)?;
    Ok(compose_optional(present, build_real, build_placeholder))
  }

  /// Decide `feature` from whether its configuration is present.
  ///
  /// The configuration, when there is one, is handed to `build_real`.
  pub fn compose_with<C, T>(
    &mut self,
    feature: &str,
    config: Option<C>,
    build_real: impl FnOnce(C) -> T,
    build_placeholder: impl FnOnce() -> T,
  ) -> Result<T, ComposeError> {
    self.record(feature, config.is_some())?;
    Ok(match config {
      Some(config) => build_real(config),
      None => build_placeholder(),
    })
  }

  fn record(&mut self, feature: &str, included: bool) -> Result<(), ComposeError> {
    if self.decision(feature).is_some() {
      return Err(ComposeError::AlreadyDecided {
        feature: feature.to_string(),
      });
    }

    info!(feature, included, "optional feature decided");
    self.decisions.push(FeatureDecision {
      feature: feature.to_string(),
      included,
    });
    Ok(())
  }

  /// Whether `feature` was included, if it has been decided.
  pub fn decision(&self, feature: &str) -> Option<bool> {
    self
      .decisions
      .iter()
      .find(|d| d.feature == feature)
      .map(|d| d.included)
  }

  pub fn decisions(&self) -> &[FeatureDecision] {
    &self.decisions
  }

  pub fn into_decisions(self) -> Vec<FeatureDecision> {
    self.decisions
  }
}
