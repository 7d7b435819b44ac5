use std::collections::BTreeMap;

use precisionmed_graph::{DeferredValue, Interpolation, ResolveError, ResolvedSet};
use serde::Serialize;

use crate::error::OutputError;
use crate::name::OutputName;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutputValue {
  Literal(String),
  Deferred(DeferredValue),
  Interpolated(Interpolation),
}

impl OutputValue {
  fn resolve(&self, resolved: &ResolvedSet) -> Result<String, ResolveError> {
    match self {
      OutputValue::Literal(value) => Ok(value.clone()),
      OutputValue::Deferred(value) => value.resolve(resolved),
      OutputValue::Interpolated(value) => value.resolve(resolved),
    }
  }

  fn references(&self) -> Vec<&DeferredValue> {
    match self {
      OutputValue::Literal(_) => Vec::new(),
      OutputValue::Deferred(value) => vec![value],
      OutputValue::Interpolated(value) => value.references().collect(),
    }
  }
}

impl From<&str> for OutputValue {
  fn from(value: &str) -> Self {
    OutputValue::Literal(value.to_string())
  }
}

impl From<String> for OutputValue {
  fn from(value: String) -> Self {
    OutputValue::Literal(value)
  }
}

impl From<DeferredValue> for OutputValue {
  fn from(value: DeferredValue) -> Self {
    OutputValue::Deferred(value)
  }
}

impl From<Interpolation> for OutputValue {
  fn from(value: Interpolation) -> Self {
    OutputValue::Interpolated(value)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackOutput {
  pub name: OutputName,
  pub value: OutputValue,
}

/// Registers outputs while the stack is being built.
#[derive(Debug, Default)]
pub struct OutputAggregator {
  outputs: Vec<StackOutput>,
}

impl OutputAggregator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register(
    &mut self,
    name: OutputName,
    value: impl Into<OutputValue>,
  ) -> Result<(), OutputError> {
    if self.outputs.iter().any(|o| o.name == name) {
      return Err(OutputError::DuplicateOutput {
        name: name.to_string(),
      });
    }
    self.outputs.push(StackOutput {
      name,
      value: value.into(),
    });
    Ok(())
  }

  /// Register by output name string.
  pub fn register_named(
    &mut self,
    name: &str,
    value: impl Into<OutputValue>,
  ) -> Result<(), OutputError> {
    self.register(name.parse()?, value)
  }

  /// Finish registration. Every name in [`OutputName::ALL`] must be present.
  pub fn seal(self) -> Result<SealedOutputs, OutputError> {
    let missing: Vec<String> = OutputName::ALL
      .iter()
      .filter(|name| !self.outputs.iter().any(|o| o.name == **name))
      .map(|name| name.to_string())
      .collect();

    if !missing.is_empty() {
      return Err(OutputError::MissingOutputs { names: missing });
    }

    Ok(SealedOutputs {
      outputs: self.outputs,
    })
  }
}

/// The complete output set of a stack.
#[derive(Debug, Serialize)]
pub struct SealedOutputs {
  outputs: Vec<StackOutput>,
}

impl SealedOutputs {
  pub fn outputs(&self) -> &[StackOutput] {
    &self.outputs
  }

  /// Every deferred value the outputs read, with the output reading it.
  pub fn references(&self) -> Vec<(OutputName, &DeferredValue)> {
    self
      .outputs
      .iter()
      .flat_map(|o| o.value.references().into_iter().map(move |r| (o.name, r)))
      .collect()
  }

  /// Read every output from the resolved set.
  ///
  /// The result depends only on the final contents of `resolved`, not on
  /// the order producers were recorded in.
  pub fn collect(&self, resolved: &ResolvedSet) -> Result<BTreeMap<String, String>, OutputError> {
    self
      .outputs
      .iter()
      .map(|output| -> Result<(String, String), OutputError> {
        let value = output
          .value
          .resolve(resolved)
          .map_err(|source| OutputError::Unresolved {
            name: output.name.to_string(),
            source,
          })?;
        Ok((output.name.to_string(), value))
      })
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use precisionmed_graph::Attributes;

  fn register_all(aggregator: &mut OutputAggregator) {
    for name in OutputName::ALL {
      let value = match name {
        OutputName::AppUrl => OutputValue::from(
          Interpolation::new()
            .literal("https://")
            .deferred(DeferredValue::reference("app", "LoadBalancerDnsName")),
        ),
        OutputName::DbSecret => OutputValue::from(DeferredValue::reference("db", "SecretArn")),
        other => OutputValue::from(format!("literal-{}", other)),
      };
      aggregator.register(name, value).unwrap();
    }
  }

  fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect()
  }

  #[test]
  fn test_duplicate_output_rejected() {
    let mut aggregator = OutputAggregator::new();
    aggregator.register(OutputName::VpcId, "vpc-1").unwrap();
    let err = aggregator
      .register(OutputName::VpcId, "vpc-2")
      .unwrap_err();
    assert_eq!(
      err,
      OutputError::DuplicateOutput {
        name: "VpcId".to_string()
      }
    );
  }

  #[test]
  fn test_register_named() {
    let mut aggregator = OutputAggregator::new();
    aggregator.register_named("AppUrl", "https://x").unwrap();
    assert!(matches!(
      aggregator.register_named("Nope", "x"),
      Err(OutputError::UnknownOutput { .. })
    ));
    assert!(matches!(
      aggregator.register_named("AppUrl", "again"),
      Err(OutputError::DuplicateOutput { .. })
    ));
  }

  #[test]
  fn test_seal_requires_every_output() {
    let mut aggregator = OutputAggregator::new();
    aggregator.register(OutputName::VpcId, "vpc-1").unwrap();

    match aggregator.seal() {
      Err(OutputError::MissingOutputs { names }) => {
        assert_eq!(names.len(), 10);
        assert!(!names.contains(&"VpcId".to_string()));
        assert!(names.contains(&"OmicsEtlStateMachineArn".to_string()));
      }
      other => panic!("expected missing outputs, got {:?}", other),
    }
  }

  #[test]
  fn test_collect_requires_resolved_producers() {
    let mut aggregator = OutputAggregator::new();
    register_all(&mut aggregator);
    let sealed = aggregator.seal().unwrap();

    let mut resolved = ResolvedSet::new();
    resolved
      .record("app", attrs(&[("LoadBalancerDnsName", "app.elb")]))
      .unwrap();

    let err = sealed.collect(&resolved).unwrap_err();
    assert!(matches!(
      err,
      OutputError::Unresolved { ref name, .. } if name == "DbSecret"
    ));
  }

  #[test]
  fn test_collect_is_independent_of_resolution_order() {
    let build = || {
      let mut aggregator = OutputAggregator::new();
      register_all(&mut aggregator);
      aggregator.seal().unwrap()
    };

    let mut forward = ResolvedSet::new();
    forward
      .record("app", attrs(&[("LoadBalancerDnsName", "app.elb")]))
      .unwrap();
    forward
      .record("db", attrs(&[("SecretArn", "arn:secret")]))
      .unwrap();

    let mut backward = ResolvedSet::new();
    backward
      .record("db", attrs(&[("SecretArn", "arn:secret")]))
      .unwrap();
    backward
      .record("app", attrs(&[("LoadBalancerDnsName", "app.elb")]))
      .unwrap();

    let a = build().collect(&forward).unwrap();
    let b = build().collect(&backward).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 11);
    assert_eq!(a["AppUrl"], "https://app.elb");
    assert_eq!(a["DbSecret"], "arn:secret");
  }

  #[test]
  fn test_references_name_their_output() {
    let mut aggregator = OutputAggregator::new();
    register_all(&mut aggregator);
    let sealed = aggregator.seal().unwrap();

    let refs: Vec<(OutputName, &str)> = sealed
      .references()
      .into_iter()
      .map(|(name, r)| (name, r.producer_id()))
      .collect();
    assert_eq!(
      refs,
      vec![(OutputName::AppUrl, "app"), (OutputName::DbSecret, "db")]
    );
  }
}
