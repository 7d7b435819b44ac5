use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::error::ResolveError;
use crate::resolved::ResolvedSet;
use crate::spec::{ResourceKind, ResourceSpec};

/// A frozen, validated resource graph.
///
/// Exposes both a deterministic linear order and "ready" batches: every node
/// in a batch depends only on nodes in earlier batches, so a batch can be
/// dispatched concurrently once its predecessors complete.
#[derive(Debug, Serialize)]
pub struct OrderedPlan {
  #[serde(skip)]
  nodes: Vec<ResourceSpec>,
  #[serde(skip)]
  index: HashMap<String, usize>,
  order: Vec<String>,
  batches: Vec<Vec<String>>,
}

/// A node whose configuration has been fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedResource {
  pub id: String,
  pub kind: ResourceKind,
  pub config: BTreeMap<String, serde_json::Value>,
}

impl OrderedPlan {
  pub(crate) fn new(
    nodes: Vec<ResourceSpec>,
    index: HashMap<String, usize>,
    order: Vec<String>,
    batches: Vec<Vec<String>>,
  ) -> Self {
    Self {
      nodes,
      index,
      order,
      batches,
    }
  }

  /// Node ids such that every node follows all of its dependencies.
  pub fn order(&self) -> &[String] {
    &self.order
  }

  pub fn batches(&self) -> &[Vec<String>] {
    &self.batches
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn spec(&self, node_id: &str) -> Option<&ResourceSpec> {
    self.index.get(node_id).map(|&i| &self.nodes[i])
  }

  pub fn contains(&self, node_id: &str) -> bool {
    self.index.contains_key(node_id)
  }

  /// Specs in plan order.
  pub fn specs(&self) -> impl Iterator<Item = &ResourceSpec> {
    self.order.iter().filter_map(|id| self.spec(id))
  }

  /// Dependencies of a node, including those implied by deferred references.
  pub fn dependencies(&self, node_id: &str) -> Option<&BTreeSet<String>> {
    self.spec(node_id).map(|spec| &spec.depends_on)
  }

  /// Nodes not yet resolved whose dependencies all are, in plan order.
  pub fn ready(&self, resolved: &ResolvedSet) -> Vec<&str> {
    self
      .specs()
      .filter(|spec| !resolved.contains(&spec.id))
      .filter(|spec| spec.depends_on.iter().all(|d| resolved.contains(d)))
      .map(|spec| spec.id.as_str())
      .collect()
  }

  /// Resolve a node's configuration.
  ///
  /// A node is eligible only after all of its dependencies are recorded in
  /// `resolved`; until then this fails with
  /// [`ResolveError::UnresolvedDependency`].
  pub fn resolve_node(
    &self,
    node_id: &str,
    resolved: &ResolvedSet,
  ) -> Result<ResolvedResource, ResolveError> {
    let spec = self.spec(node_id).ok_or_else(|| ResolveError::UnknownNode {
      node_id: node_id.to_string(),
    })?;

    if let Some(pending) = spec.depends_on.iter().find(|d| !resolved.contains(d)) {
      return Err(ResolveError::UnresolvedDependency {
        producer_id: pending.clone(),
        needed_by: format!("node '{}'", node_id),
      });
    }

    let config = spec
      .config
      .iter()
      .map(|(key, value)| value.resolve(resolved).map(|v| (key.clone(), v)))
      .collect::<Result<BTreeMap<_, _>, _>>()?;

    Ok(ResolvedResource {
      id: spec.id.clone(),
      kind: spec.kind,
      config,
    })
  }
}
