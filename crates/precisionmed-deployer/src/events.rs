//! Deployment events and notifiers.
//!
//! The deployer reports progress through a [`DeploymentNotifier`] so callers
//! can log, persist or stream it.

use precisionmed_graph::Attributes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted while a plan is deployed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeploymentEvent {
  /// The deployment has started; `node_count` nodes will be attempted.
  DeploymentStarted {
    deployment_id: String,
    workload_name: String,
    node_count: usize,
  },

  /// A node was handed to the executor.
  NodeStarted {
    deployment_id: String,
    node_id: String,
  },

  /// A node finished and its attributes were recorded.
  NodeProvisioned {
    deployment_id: String,
    node_id: String,
    attributes: Attributes,
  },

  /// The executor reported a failure for a node. No dependent of it is
  /// attempted.
  NodeFailed {
    deployment_id: String,
    node_id: String,
    error: String,
  },

  /// Every node was provisioned and all outputs resolved.
  DeploymentCompleted { deployment_id: String },

  /// The deployment stopped on a failure or cancellation.
  DeploymentFailed { deployment_id: String, error: String },
}

/// Receives deployment events.
///
/// The deployer calls `notify` synchronously for each event, in order.
/// Implementations decide what to do with them.
pub trait DeploymentNotifier: Send + Sync {
  /// Called once per event.
  fn notify(&self, event: DeploymentEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl DeploymentNotifier for NoopNotifier {
  fn notify(&self, _event: DeploymentEvent) {}
}

/// Forwards events to an unbounded channel.
///
/// Unbounded so a slow consumer never stalls provisioning; event volume is
/// a handful per node.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<DeploymentEvent>,
}

impl ChannelNotifier {
  /// Notifier sending on `sender`.
  pub fn new(sender: mpsc::UnboundedSender<DeploymentEvent>) -> Self {
    Self { sender }
  }
}

impl DeploymentNotifier for ChannelNotifier {
  fn notify(&self, event: DeploymentEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
