//! Deployment driver.
//!
//! Walks a frozen plan batch by batch: every node whose dependencies are all
//! recorded is resolved and handed to the executor concurrently, and the
//! batch must finish before the next one is computed. Cancelling aborts the
//! tasks of the in-flight batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use precisionmed_graph::{Attributes, ResolvedResource, ResolvedSet};
use precisionmed_stack::DeploymentPlan;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::error::{DeployError, ProvisionError};
use crate::events::{DeploymentEvent, DeploymentNotifier, NoopNotifier};
use crate::executor::ProvisioningExecutor;

/// Result of a completed deployment.
#[derive(Debug)]
pub struct DeploymentResult {
  pub deployment_id: String,
  /// Output name to final value.
  pub outputs: BTreeMap<String, String>,
  pub resolved: ResolvedSet,
}

/// Drives a [`DeploymentPlan`] through a [`ProvisioningExecutor`].
///
/// Generic over `N: DeploymentNotifier`. Use [`Deployer::new`] to discard
/// events or [`Deployer::with_notifier`] to observe them.
pub struct Deployer<E: ProvisioningExecutor, N: DeploymentNotifier = NoopNotifier> {
  executor: Arc<E>,
  notifier: N,
}

impl<E: ProvisioningExecutor + 'static> Deployer<E, NoopNotifier> {
  pub fn new(executor: Arc<E>) -> Self {
    Self::with_notifier(executor, NoopNotifier)
  }
}

impl<E: ProvisioningExecutor + 'static, N: DeploymentNotifier> Deployer<E, N> {
  pub fn with_notifier(executor: Arc<E>, notifier: N) -> Self {
    Self { executor, notifier }
  }

  /// Provision every node of `plan`, then collect the stack outputs.
  ///
  /// The plan is consumed: deferred values cache what they resolve to, so a
  /// plan backs exactly one deployment. The first node failure aborts the
  /// deployment; nodes that depend on it are never attempted and nothing is
  /// retried.
  pub async fn deploy(
    &self,
    plan: DeploymentPlan,
    cancel: CancellationToken,
  ) -> Result<DeploymentResult, DeployError> {
    let deployment_id = uuid::Uuid::new_v4().to_string();

    self.notifier.notify(DeploymentEvent::DeploymentStarted {
      deployment_id: deployment_id.clone(),
      workload_name: plan.workload_name.clone(),
      node_count: plan.plan.len(),
    });

    let result = self.run_deployment(&plan, &deployment_id, &cancel).await;

    match &result {
      Ok(_) => {
        info!(%deployment_id, "deployment completed");
        self.notifier.notify(DeploymentEvent::DeploymentCompleted {
          deployment_id: deployment_id.clone(),
        });
      }
      Err(e) => {
        warn!(%deployment_id, error = %e, "deployment failed");
        self.notifier.notify(DeploymentEvent::DeploymentFailed {
          deployment_id: deployment_id.clone(),
          error: e.to_string(),
        });
      }
    }

    result
  }

  #[instrument(skip(self, plan, cancel), fields(workload = %plan.workload_name))]
  async fn run_deployment(
    &self,
    plan: &DeploymentPlan,
    deployment_id: &str,
    cancel: &CancellationToken,
  ) -> Result<DeploymentResult, DeployError> {
    let mut resolved = ResolvedSet::new();

    loop {
      if cancel.is_cancelled() {
        return Err(DeployError::Cancelled);
      }

      let ready = plan.plan.ready(&resolved);
      if ready.is_empty() {
        break;
      }

      let resources = ready
        .iter()
        .map(|node_id| plan.plan.resolve_node(node_id, &resolved))
        .collect::<Result<Vec<_>, _>>()?;

      info!(batch_size = resources.len(), "provisioning batch");
      for resource in &resources {
        self.notifier.notify(DeploymentEvent::NodeStarted {
          deployment_id: deployment_id.to_string(),
          node_id: resource.id.clone(),
        });
      }

      let mut tasks = JoinSet::new();
      for resource in resources {
        tasks.spawn(provision_node(Arc::clone(&self.executor), resource));
      }

      // Dropping the set on cancellation aborts whatever is still running.
      let mut results = Vec::with_capacity(tasks.len());
      loop {
        let joined = tokio::select! {
            joined = tasks.join_next() => joined,
            _ = cancel.cancelled() => return Err(DeployError::Cancelled),
        };
        match joined {
          Some(result) => results.push(result.map_err(|e| DeployError::Task(e.to_string()))?),
          None => break,
        }
      }

      for (node_id, outcome) in results {

        match outcome {
          Ok(attributes) => {
            self.notifier.notify(DeploymentEvent::NodeProvisioned {
              deployment_id: deployment_id.to_string(),
              node_id: node_id.clone(),
              attributes: attributes.clone(),
            });
            resolved.record(&node_id, attributes)?;
          }
          Err(e) => {
            self.notifier.notify(DeploymentEvent::NodeFailed {
              deployment_id: deployment_id.to_string(),
              node_id: node_id.clone(),
              error: e.to_string(),
            });
            return Err(DeployError::ProvisioningFailed {
              node_id,
              message: e.message,
            });
          }
        }
      }
    }

    let outputs = plan.outputs.collect(&resolved)?;

    Ok(DeploymentResult {
      deployment_id: deployment_id.to_string(),
      outputs,
      resolved,
    })
  }
}

#[instrument(skip_all, fields(node_id = %resource.id, kind = ?resource.kind))]
async fn provision_node<E: ProvisioningExecutor>(
  executor: Arc<E>,
  resource: ResolvedResource,
) -> (String, Result<Attributes, ProvisionError>) {
  let outcome = executor.provision(&resource).await;
  if let Err(e) = &outcome {
    warn!(error = %e, "node provisioning failed");
  }
  (resource.id, outcome)
}
