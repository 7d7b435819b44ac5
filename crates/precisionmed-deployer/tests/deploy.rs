use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use precisionmed_config::{PhiResidency, StackConfig};
use precisionmed_deployer::{
  ChannelNotifier, DeployError, Deployer, DeploymentEvent, ProvisionError, ProvisioningExecutor,
  SimulatedExecutor,
};
use precisionmed_graph::{Attributes, ResolvedResource};
use precisionmed_stack::{DeploymentPlan, build_stack, ids};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

fn config() -> StackConfig {
  StackConfig {
    workload_name: "pm".to_string(),
    health_lake_region: "us-east-1".to_string(),
    phi_residency: PhiResidency::MultiRegionDr,
    rps_target: 120,
    daily_patients: 8000,
    omics_monthly_gb: 2000,
    tls_certificate_arn: "arn:aws:acm:us-east-1:123456789012:certificate/abc".to_string(),
    smart_callback_urls: vec!["https://pm.example/callback".to_string()],
    smart_logout_urls: Vec::new(),
    smart_authorizer_lambda_arn: "arn:aws:lambda:us-east-1:123456789012:function:auth"
      .to_string(),
    app_image: "registry.example/app:1".to_string(),
    inference_image: "registry.example/inference:1".to_string(),
    glue_job_name: Some("etl-v1".to_string()),
    batch_job_definition_arn: Some("arn:job-def".to_string()),
    batch_queue_arn: Some("arn:queue".to_string()),
  }
}

fn plan() -> DeploymentPlan {
  build_stack(&config()).unwrap().freeze().unwrap()
}

fn simulated() -> SimulatedExecutor {
  SimulatedExecutor::new("123456789012", "us-east-1")
}

#[tokio::test]
async fn test_simulated_deployment_reports_all_outputs() {
  let plan = plan();
  let executor = Arc::new(simulated());
  let deployer = Deployer::new(Arc::clone(&executor));
  let node_count = plan.plan.len();

  let result = deployer
    .deploy(plan, CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(result.outputs.len(), 11);
  assert!(result.outputs["AppUrl"].starts_with("https://internal-pm-app-"));
  assert!(result.outputs["InferenceNlbDns"].starts_with("internal-pm-inference-"));
  assert!(result.outputs["OmicsEtlStateMachineArn"].ends_with(":stateMachine:pm-omics-etl"));
  assert_eq!(result.resolved.len(), node_count);
  assert_eq!(executor.provisioned().await.len(), node_count);
}

#[tokio::test]
async fn test_nodes_provision_after_their_dependencies() {
  let plan = plan();
  let edges: Vec<(String, String)> = plan
    .plan
    .specs()
    .flat_map(|spec| {
      spec
        .depends_on
        .iter()
        .map(move |dependency| (dependency.clone(), spec.id.clone()))
    })
    .collect();

  let executor = Arc::new(simulated());
  Deployer::new(Arc::clone(&executor))
    .deploy(plan, CancellationToken::new())
    .await
    .unwrap();

  let provisioned = executor.provisioned().await;
  let position = |id: &str| provisioned.iter().position(|n| n == id).unwrap();
  for (dependency, dependent) in &edges {
    assert!(
      position(dependency) < position(dependent),
      "{} provisioned before its dependency {}",
      dependent,
      dependency
    );
  }
}

#[tokio::test]
async fn test_failed_node_halts_dependents() {
  let plan = plan();
  let executor = Arc::new(simulated().fail_on(ids::OMOP_DB));
  let deployer = Deployer::new(Arc::clone(&executor));

  let err = deployer
    .deploy(plan, CancellationToken::new())
    .await
    .unwrap_err();
  match err {
    DeployError::ProvisioningFailed { node_id, .. } => assert_eq!(node_id, ids::OMOP_DB),
    other => panic!("expected provisioning failure, got {:?}", other),
  }

  let provisioned = executor.provisioned().await;
  assert!(!provisioned.iter().any(|n| n == ids::APP_SERVICE));
  assert!(!provisioned.iter().any(|n| n == ids::TASK_ROLE));
}

#[tokio::test]
async fn test_cancelled_before_start_provisions_nothing() {
  let plan = plan();
  let executor = Arc::new(simulated());
  let cancel = CancellationToken::new();
  cancel.cancel();

  let err = Deployer::new(Arc::clone(&executor))
    .deploy(plan, cancel)
    .await
    .unwrap_err();
  assert!(matches!(err, DeployError::Cancelled));
  assert!(executor.provisioned().await.is_empty());
}

/// Never finishes provisioning.
struct StuckExecutor;

#[async_trait]
impl ProvisioningExecutor for StuckExecutor {
  async fn provision(&self, _resource: &ResolvedResource) -> Result<Attributes, ProvisionError> {
    tokio::time::sleep(Duration::from_secs(3600)).await;
    Err(ProvisionError::new("unreachable"))
  }
}

#[tokio::test]
async fn test_cancel_interrupts_in_flight_batch() {
  let plan = plan();
  let cancel = CancellationToken::new();
  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(20)).await;
    trigger.cancel();
  });

  let err = Deployer::new(Arc::new(StuckExecutor))
    .deploy(plan, cancel)
    .await
    .unwrap_err();
  assert!(matches!(err, DeployError::Cancelled));
}

#[tokio::test]
async fn test_events_bracket_the_deployment() {
  let plan = plan();
  let node_count = plan.plan.len();
  let (tx, mut rx) = mpsc::unbounded_channel();
  let deployer = Deployer::with_notifier(Arc::new(simulated()), ChannelNotifier::new(tx));

  let result = deployer
    .deploy(plan, CancellationToken::new())
    .await
    .unwrap();
  drop(deployer);

  let mut events = Vec::new();
  while let Some(event) = rx.recv().await {
    events.push(event);
  }

  assert!(matches!(
    events.first(),
    Some(DeploymentEvent::DeploymentStarted { node_count: started, .. }) if *started == node_count
  ));
  assert_eq!(
    events.last(),
    Some(&DeploymentEvent::DeploymentCompleted {
      deployment_id: result.deployment_id.clone()
    })
  );
  let provisioned = events
    .iter()
    .filter(|e| matches!(e, DeploymentEvent::NodeProvisioned { .. }))
    .count();
  assert_eq!(provisioned, node_count);
}

#[tokio::test]
async fn test_each_plan_reports_its_own_deployment() {
  let first = Deployer::new(Arc::new(SimulatedExecutor::new("111111111111", "us-east-1")))
    .deploy(plan(), CancellationToken::new())
    .await
    .unwrap();
  let second = Deployer::new(Arc::new(SimulatedExecutor::new("222222222222", "eu-west-1")))
    .deploy(plan(), CancellationToken::new())
    .await
    .unwrap();

  assert!(first.outputs["DbSecret"].starts_with("arn:aws:secretsmanager:us-east-1:111111111111:"));
  assert!(second.outputs["DbSecret"].starts_with("arn:aws:secretsmanager:eu-west-1:222222222222:"));
  assert_eq!(
    second.outputs["DbSecret"],
    second.resolved.attributes(ids::OMOP_DB).unwrap()[ids::attr::SECRET_ARN]
  );
}

/// Records every node whose provisioning ran to completion.
#[derive(Default)]
struct SlowExecutor {
  finished: Mutex<Vec<String>>,
}

#[async_trait]
impl ProvisioningExecutor for SlowExecutor {
  async fn provision(&self, resource: &ResolvedResource) -> Result<Attributes, ProvisionError> {
    tokio::time::sleep(Duration::from_millis(200)).await;
    self.finished.lock().await.push(resource.id.clone());
    Ok(Attributes::new())
  }
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_tasks() {
  let executor = Arc::new(SlowExecutor::default());
  let cancel = CancellationToken::new();
  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(20)).await;
    trigger.cancel();
  });

  let err = Deployer::new(Arc::clone(&executor))
    .deploy(plan(), cancel)
    .await
    .unwrap_err();
  assert!(matches!(err, DeployError::Cancelled));

  tokio::time::sleep(Duration::from_millis(400)).await;
  assert!(executor.finished.lock().await.is_empty());
}
