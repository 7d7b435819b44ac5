use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::value::{ConfigValue, DeferredValue};

/// The kind of cloud resource a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
  Network,
  Storage,
  Database,
  ComputeService,
  IdentityProvider,
  DataStore,
  SearchIndex,
  WorkflowStep,
  EncryptionKey,
  LogGroup,
  SecurityGroup,
  SecurityGroupRule,
  AccessRole,
  StateMachine,
}

/// A resource specification: one node of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSpec {
  pub id: String,
  pub kind: ResourceKind,
  pub config: BTreeMap<String, ConfigValue>,
  pub depends_on: BTreeSet<String>,
}

impl ResourceSpec {
  pub fn new(id: impl Into<String>, kind: ResourceKind) -> Self {
    Self {
      id: id.into(),
      kind,
      config: BTreeMap::new(),
      depends_on: BTreeSet::new(),
    }
  }

  /// Set a configuration entry.
  pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
    self.config.insert(key.into(), value.into());
    self
  }

  /// Declare an explicit dependency on another node.
  pub fn depends_on(mut self, node_id: impl Into<String>) -> Self {
    self.depends_on.insert(node_id.into());
    self
  }

  /// Every deferred value in this node's configuration.
  pub fn references(&self) -> Vec<&DeferredValue> {
    self
      .config
      .values()
      .flat_map(|value| value.references())
      .collect()
  }
}

/// Handle to a node that was added to a graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle {
  id: String,
}

impl NodeHandle {
  pub(crate) fn new(id: String) -> Self {
    Self { id }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  /// A deferred reference to one of this node's attributes.
  pub fn attr(&self, attribute_path: &str) -> DeferredValue {
    DeferredValue::reference(self.id.clone(), attribute_path)
  }
}
