use precisionmed_config::{PhiResidency, StackConfig};
use precisionmed_graph::{Attributes, ConfigValue, ResolvedSet, ResourceKind};
use precisionmed_stack::ids::{self, attr};
use precisionmed_stack::{EXTRACT_FEATURE, PROCESS_FEATURE, StackError, build_stack};
use precisionmed_workflow::{JobKind, StepKind};

fn config() -> StackConfig {
  StackConfig {
    workload_name: "precisionmed".to_string(),
    health_lake_region: "us-east-1".to_string(),
    phi_residency: PhiResidency::SingleRegion,
    rps_target: 50,
    daily_patients: 500,
    omics_monthly_gb: 500,
    tls_certificate_arn: "arn:aws:acm:us-east-1:123456789012:certificate/abc".to_string(),
    smart_callback_urls: vec!["https://app.precisionmed.health/smart/callback".to_string()],
    smart_logout_urls: vec!["https://app.precisionmed.health/logout".to_string()],
    smart_authorizer_lambda_arn: "arn:aws:lambda:us-east-1:123456789012:function:smart-auth"
      .to_string(),
    app_image: "registry.example/precisionmed-app:1".to_string(),
    inference_image: "registry.example/precisionmed-inference:1".to_string(),
    glue_job_name: None,
    batch_job_definition_arn: None,
    batch_queue_arn: None,
  }
}

fn with_jobs() -> StackConfig {
  StackConfig {
    glue_job_name: Some("etl-v1".to_string()),
    batch_job_definition_arn: Some("arn:job-def".to_string()),
    batch_queue_arn: Some("arn:queue".to_string()),
    ..config()
  }
}

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
  pairs
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[test]
fn test_without_optional_jobs_chain_is_two_placeholders() {
  let stack = build_stack(&config()).unwrap();

  let workflow = stack.workflow();
  assert_eq!(workflow.chain_len(), 2);
  assert!(workflow.iter().all(|step| step.is_placeholder()));
  assert!(stack.decisions().iter().all(|d| !d.included));

  let plan = stack.freeze().unwrap();
  assert!(plan.plan.dependencies(ids::EXTRACT_STEP).unwrap().is_empty());
  assert_eq!(
    plan
      .plan
      .dependencies(ids::PROCESS_STEP)
      .unwrap()
      .iter()
      .collect::<Vec<_>>(),
    vec![ids::EXTRACT_STEP]
  );
  assert_eq!(
    plan.workflow_definition["States"]["ExtractVariants"]["Type"],
    "Pass"
  );
}

#[test]
fn test_placeholder_stack_still_reports_every_output() {
  let plan = build_stack(&config()).unwrap().freeze().unwrap();

  let mut resolved = ResolvedSet::new();
  let producers: [(&str, &[(&str, &str)]); 11] = [
    (ids::VPC, &[(attr::VPC_ID, "vpc-1")]),
    (ids::APP_SERVICE, &[(attr::LOAD_BALANCER_DNS_NAME, "app.elb")]),
    (ids::INFERENCE_SERVICE, &[(attr::LOAD_BALANCER_DNS_NAME, "inference.elb")]),
    (ids::OMOP_DB, &[(attr::SECRET_ARN, "arn:secret")]),
    (ids::RAW_BUCKET, &[(attr::BUCKET_NAME, "raw")]),
    (ids::CURATED_BUCKET, &[(attr::BUCKET_NAME, "curated")]),
    (ids::FEATURE_BUCKET, &[(attr::BUCKET_NAME, "features")]),
    (ids::USER_POOL, &[(attr::USER_POOL_ID, "pool-1")]),
    (ids::USER_POOL_CLIENT, &[(attr::CLIENT_ID, "client-1")]),
    (ids::SEARCH_DOMAIN, &[(attr::DOMAIN_ENDPOINT, "search.local")]),
    (ids::OMICS_ETL, &[(attr::STATE_MACHINE_ARN, "arn:states")]),
  ];
  for (id, pairs) in producers {
    resolved.record(id, attrs(pairs)).unwrap();
  }

  let outputs = plan.outputs.collect(&resolved).unwrap();
  assert_eq!(outputs.len(), 11);
  assert_eq!(outputs["AppUrl"], "https://app.elb");
  assert_eq!(outputs["OmicsEtlStateMachineArn"], "arn:states");
}

#[test]
fn test_configured_jobs_build_real_chain() {
  let stack = build_stack(&with_jobs()).unwrap();

  let head = stack.workflow();
  let first = head.job().unwrap();
  assert_eq!((first.job_kind, first.job_ref.as_str()), (JobKind::Glue, "etl-v1"));

  let tail = head.next.as_deref().unwrap();
  match &tail.kind {
    StepKind::Real(job) => {
      assert_eq!(job.job_kind, JobKind::Batch);
      assert_eq!(job.job_ref, "arn:job-def");
      assert_eq!(job.job_queue.as_deref(), Some("arn:queue"));
    }
    StepKind::Placeholder => panic!("expected a batch step"),
  }
  assert!(tail.is_terminal());
  assert_eq!(head.chain_len(), 2);

  let role = stack.graph().get(ids::ETL_ROLE).unwrap();
  assert_eq!(
    role.config["glueJobs"],
    ConfigValue::from(vec!["etl-v1"])
  );

  let plan = stack.freeze().unwrap();
  let states = &plan.workflow_definition["States"];
  assert_eq!(
    states["ExtractVariants"]["Resource"],
    "arn:aws:states:::glue:startJobRun.sync"
  );
  assert_eq!(states["ProcessVariants"]["End"], true);

  // A real extraction step reads both buckets it moves data between.
  let extract_deps = plan.plan.dependencies(ids::EXTRACT_STEP).unwrap();
  assert!(extract_deps.contains(ids::RAW_BUCKET));
  assert!(extract_deps.contains(ids::CURATED_BUCKET));
}

#[test]
fn test_partial_batch_configuration_uses_placeholder() {
  let config = StackConfig {
    batch_job_definition_arn: Some("arn:job-def".to_string()),
    ..config()
  };
  let stack = build_stack(&config).unwrap();

  assert!(stack.workflow().next.as_deref().unwrap().is_placeholder());
  let decisions: Vec<(&str, bool)> = stack
    .decisions()
    .iter()
    .map(|d| (d.feature.as_str(), d.included))
    .collect();
  assert_eq!(
    decisions,
    vec![(EXTRACT_FEATURE, false), (PROCESS_FEATURE, false)]
  );
}

#[test]
fn test_ingress_rules_are_directional_nodes() {
  let plan = build_stack(&config()).unwrap().freeze().unwrap();
  assert_eq!(plan.rules.len(), 5);

  let app_to_data = plan.plan.spec("ingress-app-to-data-5432-tcp").unwrap();
  assert_eq!(app_to_data.kind, ResourceKind::SecurityGroupRule);
  assert!(app_to_data.depends_on.contains(ids::APP_SG));
  assert!(app_to_data.depends_on.contains(ids::DATA_SG));

  assert!(!plan.plan.contains("ingress-data-to-app-5432-tcp"));
  assert!(plan.plan.contains("ingress-inference-to-search-443-tcp"));
}

#[test]
fn test_app_service_waits_for_everything_it_reads() {
  let plan = build_stack(&with_jobs()).unwrap().freeze().unwrap();
  let order = plan.plan.order();
  let position = |id: &str| order.iter().position(|n| n == id).unwrap();

  let app = position(ids::APP_SERVICE);
  for producer in [
    ids::INFERENCE_SERVICE,
    ids::OMOP_DB,
    ids::USER_POOL,
    ids::USER_POOL_CLIENT,
    ids::FHIR_DATASTORE,
    ids::SEARCH_DOMAIN,
    ids::TASK_ROLE,
  ] {
    assert!(position(producer) < app, "{} should precede app", producer);
  }
  assert!(position(ids::PROCESS_STEP) < position(ids::OMICS_ETL));
}

#[test]
fn test_invalid_config_is_rejected_before_building() {
  let config = StackConfig {
    smart_callback_urls: Vec::new(),
    ..config()
  };
  assert!(matches!(build_stack(&config), Err(StackError::Config(_))));
}

#[test]
fn test_plan_document_lists_resources_in_order() {
  let plan = build_stack(&config()).unwrap().freeze().unwrap();
  let document = plan.to_document();

  let resources = document["resources"].as_array().unwrap();
  assert_eq!(resources.len(), plan.plan.len());
  assert_eq!(document["featureDecisions"].as_array().unwrap().len(), 2);
  assert_eq!(document["outputs"].as_array().unwrap().len(), 11);
  assert_eq!(
    document["outputs"][0],
    serde_json::json!({ "name": "VpcId", "value": "${vpc.VpcId}" })
  );
}
