use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::{debug, info};

use crate::error::GraphError;
use crate::plan::OrderedPlan;
use crate::spec::{NodeHandle, ResourceSpec};

/// Graph of resource specifications under construction.
///
/// Nodes keep their insertion order, which breaks ties in the frozen plan.
/// Structural validity (known endpoints, acyclicity) is checked by
/// [`ResourceGraph::freeze`]; nothing built from an unfrozen graph may run.
#[derive(Debug, Default)]
pub struct ResourceGraph {
  nodes: Vec<ResourceSpec>,
  index: HashMap<String, usize>,
  poisoned: Option<GraphError>,
}

impl ResourceGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a node. The graph is unchanged if the id is already taken.
  pub fn add_node(&mut self, spec: ResourceSpec) -> Result<NodeHandle, GraphError> {
    if self.index.contains_key(&spec.id) {
      return Err(GraphError::DuplicateId { node_id: spec.id });
    }

    debug!(node_id = %spec.id, kind = ?spec.kind, "node added");

    let handle = NodeHandle::new(spec.id.clone());
    self.index.insert(spec.id.clone(), self.nodes.len());
    self.nodes.push(spec);
    Ok(handle)
  }

  /// Add a dependency edge: `from` must be provisioned before `to`.
  ///
  /// Both endpoints must already exist. A rejected edge poisons the graph so
  /// that a later [`freeze`](Self::freeze) fails too.
  pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
    for endpoint in [from, to] {
      if !self.index.contains_key(endpoint) {
        let err = GraphError::UnknownNode {
          node_id: endpoint.to_string(),
          referenced_by: format!("edge {} -> {}", from, to),
        };
        self.poisoned.get_or_insert_with(|| err.clone());
        return Err(err);
      }
    }

    let to_index = self.index[to];
    self.nodes[to_index].depends_on.insert(from.to_string());
    Ok(())
  }

  pub fn contains(&self, node_id: &str) -> bool {
    self.index.contains_key(node_id)
  }

  pub fn get(&self, node_id: &str) -> Option<&ResourceSpec> {
    self.index.get(node_id).map(|&i| &self.nodes[i])
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Nodes in insertion order.
  pub fn nodes(&self) -> impl Iterator<Item = &ResourceSpec> {
    self.nodes.iter()
  }

  /// Validate the structure and produce the ordered plan.
  ///
  /// Deferred references in a node's configuration become dependencies of
  /// that node. Fails if any dependency or reference names a missing node,
  /// or if the dependencies form a cycle.
  pub fn freeze(self) -> Result<OrderedPlan, GraphError> {
    if let Some(cause) = self.poisoned {
      return Err(GraphError::Poisoned(Box::new(cause)));
    }

    let index = self.index;
    let mut nodes = self.nodes;

    for spec in &mut nodes {
      for dependency in &spec.depends_on {
        if !index.contains_key(dependency) {
          return Err(GraphError::UnknownNode {
            node_id: dependency.clone(),
            referenced_by: format!("dependency of node '{}'", spec.id),
          });
        }
      }

      let producers: Vec<String> = spec
        .references()
        .iter()
        .map(|value| value.producer_id().to_string())
        .collect();
      for producer in producers {
        if !index.contains_key(&producer) {
          return Err(GraphError::UnknownNode {
            node_id: producer,
            referenced_by: format!("deferred value in node '{}'", spec.id),
          });
        }
        spec.depends_on.insert(producer);
      }
    }

    let dependents = dependents_of(&nodes, &index);
    let order = linear_order(&nodes, &dependents);

    if order.len() < nodes.len() {
      let placed: HashSet<usize> = order.iter().copied().collect();
      let stuck = cycle_members(&nodes, &dependents, &placed);
      return Err(GraphError::CycleDetected {
        nodes: stuck.into_iter().map(|i| nodes[i].id.clone()).collect(),
      });
    }

    let batches = ready_batches(&nodes, &dependents);

    info!(
      node_count = nodes.len(),
      batch_count = batches.len(),
      "resource graph frozen"
    );

    let order = order.into_iter().map(|i| nodes[i].id.clone()).collect();
    let batches = batches
      .into_iter()
      .map(|batch| batch.into_iter().map(|i| nodes[i].id.clone()).collect())
      .collect();

    Ok(OrderedPlan::new(nodes, index, order, batches))
  }
}

/// Reverse adjacency: node index -> indices of nodes that depend on it.
fn dependents_of(nodes: &[ResourceSpec], index: &HashMap<String, usize>) -> Vec<Vec<usize>> {
  let mut dependents = vec![Vec::new(); nodes.len()];
  for (i, spec) in nodes.iter().enumerate() {
    for dependency in &spec.depends_on {
      dependents[index[dependency]].push(i);
    }
  }
  dependents
}

/// Kahn's algorithm, always taking the earliest-inserted ready node.
fn linear_order(nodes: &[ResourceSpec], dependents: &[Vec<usize>]) -> Vec<usize> {
  let mut in_degree: Vec<usize> = nodes.iter().map(|n| n.depends_on.len()).collect();
  let mut ready: BinaryHeap<Reverse<usize>> = in_degree
    .iter()
    .enumerate()
    .filter(|(_, d)| **d == 0)
    .map(|(i, _)| Reverse(i))
    .collect();

  let mut order = Vec::with_capacity(nodes.len());
  while let Some(Reverse(i)) = ready.pop() {
    order.push(i);
    for &dependent in &dependents[i] {
      in_degree[dependent] -= 1;
      if in_degree[dependent] == 0 {
        ready.push(Reverse(dependent));
      }
    }
  }
  order
}

/// Group nodes into levels: each batch holds every node whose dependencies
/// all sit in earlier batches. Only called on acyclic graphs.
fn ready_batches(nodes: &[ResourceSpec], dependents: &[Vec<usize>]) -> Vec<Vec<usize>> {
  let mut in_degree: Vec<usize> = nodes.iter().map(|n| n.depends_on.len()).collect();
  let mut current: Vec<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();

  let mut batches = Vec::new();
  while !current.is_empty() {
    let mut next = Vec::new();
    for &i in &current {
      for &dependent in &dependents[i] {
        in_degree[dependent] -= 1;
        if in_degree[dependent] == 0 {
          next.push(dependent);
        }
      }
    }
    next.sort_unstable();
    batches.push(std::mem::replace(&mut current, next));
  }
  batches
}

/// Narrow the unplaced nodes down to those on or between cycles by pruning
/// nodes that nothing unplaced depends on.
fn cycle_members(
  nodes: &[ResourceSpec],
  dependents: &[Vec<usize>],
  placed: &HashSet<usize>,
) -> Vec<usize> {
  let mut remaining: HashSet<usize> = (0..nodes.len()).filter(|i| !placed.contains(i)).collect();
  loop {
    let leaves: Vec<usize> = remaining
      .iter()
      .copied()
      .filter(|&i| !dependents[i].iter().any(|d| remaining.contains(d)))
      .collect();
    if leaves.is_empty() {
      break;
    }
    for leaf in leaves {
      remaining.remove(&leaf);
    }
  }
  let mut members: Vec<usize> = remaining.into_iter().collect();
  members.sort_unstable();
  members
}
