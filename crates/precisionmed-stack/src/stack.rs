use precisionmed_config::SizingPlan;
use precisionmed_graph::{GraphError, OrderedPlan, ResourceGraph};
use precisionmed_outputs::SealedOutputs;
use precisionmed_policy::{SecurityPolicyRule, SecurityPolicyWirer};
use precisionmed_workflow::{FeatureDecision, WorkflowStep};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::info;

use crate::error::StackError;

/// A fully built, not yet frozen, platform stack.
#[derive(Debug)]
pub struct Stack {
  pub(crate) workload_name: String,
  pub(crate) sizing: SizingPlan,
  pub(crate) graph: ResourceGraph,
  pub(crate) policy: SecurityPolicyWirer,
  pub(crate) workflow: WorkflowStep,
  pub(crate) workflow_definition: Value,
  pub(crate) outputs: SealedOutputs,
  pub(crate) decisions: Vec<FeatureDecision>,
}

impl Stack {
  pub fn graph(&self) -> &ResourceGraph {
    &self.graph
  }

  pub fn policy(&self) -> &SecurityPolicyWirer {
    &self.policy
  }

  pub fn workflow(&self) -> &WorkflowStep {
    &self.workflow
  }

  pub fn decisions(&self) -> &[FeatureDecision] {
    &self.decisions
  }

  pub fn outputs(&self) -> &SealedOutputs {
    &self.outputs
  }

  /// Validate the whole stack and produce the deployment plan.
  ///
  /// Every output must read a node that exists in the graph, in addition to
  /// the structural checks of [`ResourceGraph::freeze`].
  pub fn freeze(self) -> Result<DeploymentPlan, StackError> {
    for (name, reference) in self.outputs.references() {
      if !self.graph.contains(reference.producer_id()) {
        return Err(
          GraphError::UnknownNode {
            node_id: reference.producer_id().to_string(),
            referenced_by: format!("output '{}'", name),
          }
          .into(),
        );
      }
    }

    let plan = self.graph.freeze()?;
    info!(
      workload = %self.workload_name,
      nodes = plan.len(),
      batches = plan.batches().len(),
      "deployment plan ready"
    );

    Ok(DeploymentPlan {
      workload_name: self.workload_name,
      sizing: self.sizing,
      plan,
      rules: self.policy.rules().to_vec(),
      workflow: self.workflow,
      workflow_definition: self.workflow_definition,
      outputs: self.outputs,
      decisions: self.decisions,
    })
  }
}

/// The validated plan handed to a provisioning executor.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPlan {
  pub workload_name: String,
  pub sizing: SizingPlan,
  pub plan: OrderedPlan,
  pub rules: Vec<SecurityPolicyRule>,
  pub workflow: WorkflowStep,
  pub workflow_definition: Value,
  pub outputs: SealedOutputs,
  pub decisions: Vec<FeatureDecision>,
}

impl DeploymentPlan {
  /// JSON summary of the plan. Deferred values print as `${node.Attribute}`.
  pub fn to_document(&self) -> Value {
    json!({
      "workloadName": self.workload_name,
      "sizing": self.sizing,
      "batches": self.plan.batches(),
      "resources": self.plan.specs().collect::<Vec<_>>(),
      "securityRules": self.rules,
      "featureDecisions": self.decisions,
      "workflowDefinition": self.workflow_definition,
      "outputs": self.outputs.outputs(),
    })
  }
}
