use precisionmed_config::{BatchJobRef, SizingPlan, StackConfig};
use precisionmed_graph::{
  ConfigValue, GraphError, Interpolation, NodeHandle, ResourceGraph, ResourceKind, ResourceSpec,
};
use precisionmed_outputs::{OutputAggregator, OutputName, SealedOutputs};
use precisionmed_policy::{
  INFERENCE_PORT, RELATIONAL_PORT, SEARCH_PORT, SecurityPolicyWirer, Tier, wire_platform_intents,
};
use precisionmed_workflow::{ConditionalComposer, JobKind, WorkflowAssembler, WorkflowStep};
use tracing::{info, instrument, warn};

use crate::error::StackError;
use crate::ids::{self, attr};
use crate::stack::Stack;

/// Optional feature: Glue bulk extraction.
pub const EXTRACT_FEATURE: &str = "bulk-extraction";
/// Optional feature: Batch variant processing.
pub const PROCESS_FEATURE: &str = "batch-processing";

pub const EXTRACT_STATE: &str = "ExtractVariants";
pub const PROCESS_STATE: &str = "ProcessVariants";

const ETL_TIMEOUT_SECONDS: u64 = 6 * 60 * 60;
const LOG_RETENTION_DAYS: u32 = 30;
const HTTPS_PORT: u16 = 443;
const APP_CONTAINER_PORT: u16 = 3000;
const INFERENCE_CPU: u32 = 1024;
const INFERENCE_MEMORY_MIB: u32 = 2048;
const OMOP_DB_NAME: &str = "postgres";
const OMOP_DB_USER: &str = "fhir_omop_admin";
const SEARCH_INSTANCE_TYPE: &str = "r6g.large.search";
const USER_GROUPS: [&str; 4] = ["clinician", "patient", "caregiver", "admin"];

/// Build the platform stack for `config`.
///
/// Validates the configuration, wires the tier policy and adds every
/// resource node to a fresh graph. The graph is not frozen here; see
/// [`Stack::freeze`].
#[instrument(skip(config), fields(workload = %config.workload_name))]
pub fn build_stack(config: &StackConfig) -> Result<Stack, StackError> {
  config.validate()?;

  let mut policy = SecurityPolicyWirer::new();
  wire_platform_intents(&mut policy);

  let builder = StackBuilder {
    config,
    sizing: config.sizing(),
    graph: ResourceGraph::new(),
    policy,
  };
  builder.build()
}

struct Foundation {
  key: NodeHandle,
  vpc: NodeHandle,
  app_logs: NodeHandle,
  inference_logs: NodeHandle,
}

struct Buckets {
  raw: NodeHandle,
  curated: NodeHandle,
  feature: NodeHandle,
}

impl Buckets {
  fn arns(&self) -> Vec<ConfigValue> {
    [&self.raw, &self.curated, &self.feature]
      .into_iter()
      .map(|bucket| ConfigValue::from(bucket.attr(attr::BUCKET_ARN)))
      .collect()
  }
}

struct SecurityGroups {
  app: NodeHandle,
  inference: NodeHandle,
  data: NodeHandle,
  search: NodeHandle,
}

impl SecurityGroups {
  fn for_tier(&self, tier: Tier) -> &NodeHandle {
    match tier {
      Tier::App => &self.app,
      Tier::Inference => &self.inference,
      Tier::Data => &self.data,
      Tier::Search => &self.search,
    }
  }
}

struct Identity {
  pool: NodeHandle,
  client: NodeHandle,
}

/// Backing services the application containers talk to.
struct Backends {
  db: NodeHandle,
  fhir: NodeHandle,
  search: NodeHandle,
  identity: Identity,
}

struct Services {
  app: NodeHandle,
  inference: NodeHandle,
}

struct Etl {
  workflow: WorkflowStep,
  definition: serde_json::Value,
  state_machine: NodeHandle,
}

struct StackBuilder<'a> {
  config: &'a StackConfig,
  sizing: SizingPlan,
  graph: ResourceGraph,
  policy: SecurityPolicyWirer,
}

impl StackBuilder<'_> {
  fn build(mut self) -> Result<Stack, StackError> {
    let foundation = self.add_foundation()?;
    let buckets = self.add_buckets(&foundation.key)?;
    let groups = self.add_security_groups(&foundation.vpc)?;
    let db = self.add_database(&foundation, &groups)?;
    let identity = self.add_identity()?;
    let fhir = self.add_fhir_datastore(&foundation.key)?;
    let search = self.add_search_domain(&foundation, &groups)?;

    let backends = Backends {
      db,
      fhir,
      search,
      identity,
    };
    let services = self.add_services(&foundation, &groups, &buckets, &backends)?;

    let mut composer = ConditionalComposer::new();
    let etl = self.add_etl(&mut composer, &buckets)?;

    let outputs = self.register_outputs(&foundation, &buckets, &backends, &services, &etl)?;

    info!(
      nodes = self.graph.len(),
      rules = self.policy.len(),
      "stack built"
    );

    Ok(Stack {
      workload_name: self.config.workload_name.clone(),
      sizing: self.sizing,
      graph: self.graph,
      policy: self.policy,
      workflow: etl.workflow,
      workflow_definition: etl.definition,
      outputs,
      decisions: composer.into_decisions(),
    })
  }

  fn name(&self, suffix: &str) -> String {
    format!("{}-{}", self.config.workload_name, suffix)
  }

  fn add_foundation(&mut self) -> Result<Foundation, GraphError> {
    let key = self.graph.add_node(
      ResourceSpec::new(ids::KMS_KEY, ResourceKind::EncryptionKey)
        .with("alias", format!("alias/{}", self.name("kms")))
        .with("enableKeyRotation", true)
        .with("removalPolicy", "retain"),
    )?;

    let vpc = self.graph.add_node(
      ResourceSpec::new(ids::VPC, ResourceKind::Network)
        .with("name", self.name("vpc"))
        .with("maxAzs", 2u32)
        .with("natGateways", 1u32)
        .with(
          "subnets",
          vec![
            subnet("Public", "public"),
            subnet("App", "private_with_egress"),
            subnet("Data", "private_isolated"),
          ],
        ),
    )?;

    let app_logs = self.add_log_group(ids::APP_LOGS, "app")?;
    let inference_logs = self.add_log_group(ids::INFERENCE_LOGS, "inference")?;

    Ok(Foundation {
      key,
      vpc,
      app_logs,
      inference_logs,
    })
  }

  fn add_log_group(&mut self, id: &str, stream: &str) -> Result<NodeHandle, GraphError> {
    self.graph.add_node(
      ResourceSpec::new(id, ResourceKind::LogGroup)
        .with(
          "logGroupName",
          format!("/aws/{}/{}", self.config.workload_name, stream),
        )
        .with("retentionDays", LOG_RETENTION_DAYS)
        .with("removalPolicy", "destroy"),
    )
  }

  fn add_buckets(&mut self, key: &NodeHandle) -> Result<Buckets, GraphError> {
    let archive_after = self.sizing.raw_archive_after_days;
    let raw = self.add_bucket(ids::RAW_BUCKET, "raw", key, Some(archive_after))?;
    let curated = self.add_bucket(ids::CURATED_BUCKET, "curated", key, None)?;
    let feature = self.add_bucket(ids::FEATURE_BUCKET, "features", key, None)?;
    Ok(Buckets {
      raw,
      curated,
      feature,
    })
  }

  fn add_bucket(
    &mut self,
    id: &str,
    suffix: &str,
    key: &NodeHandle,
    archive_after_days: Option<u32>,
  ) -> Result<NodeHandle, GraphError> {
    let mut spec = ResourceSpec::new(id, ResourceKind::Storage)
      .with("bucketPrefix", self.name(suffix))
      .with("encryption", "kms")
      .with("kmsKeyArn", key.attr(attr::KEY_ARN))
      .with("blockPublicAccess", true)
      .with("enforceSsl", true)
      .with("versioned", true)
      .with("removalPolicy", "retain")
      .with(
        "crossRegionReplication",
        self.sizing.cross_region_replication,
      );
    if let Some(days) = archive_after_days {
      spec = spec.with("archiveAfterDays", days);
    }
    self.graph.add_node(spec)
  }

  fn add_security_groups(&mut self, vpc: &NodeHandle) -> Result<SecurityGroups, GraphError> {
    let groups = SecurityGroups {
      app: self.add_security_group(ids::APP_SG, Tier::App, vpc)?,
      inference: self.add_security_group(ids::INFERENCE_SG, Tier::Inference, vpc)?,
      data: self.add_security_group(ids::DATA_SG, Tier::Data, vpc)?,
      search: self.add_security_group(ids::SEARCH_SG, Tier::Search, vpc)?,
    };

    // Rules are their own nodes, so a pair of groups allowing each other
    // never forms a cycle.
    let rules = self.policy.rules().to_vec();
    for rule in rules {
      let source = groups.for_tier(rule.source_tier);
      let dest = groups.for_tier(rule.dest_tier);
      self.graph.add_node(
        ResourceSpec::new(ids::ingress_rule(&rule.slug()), ResourceKind::SecurityGroupRule)
          .with("groupId", dest.attr(attr::GROUP_ID))
          .with("sourceGroupId", source.attr(attr::GROUP_ID))
          .with("port", rule.port)
          .with("protocol", rule.protocol.as_str())
          .with(
            "description",
            format!("{} to {}", rule.source_tier, rule.dest_tier),
          ),
      )?;
    }

    Ok(groups)
  }

  fn add_security_group(
    &mut self,
    id: &str,
    tier: Tier,
    vpc: &NodeHandle,
  ) -> Result<NodeHandle, GraphError> {
    self.graph.add_node(
      ResourceSpec::new(id, ResourceKind::SecurityGroup)
        .with("groupName", self.name(&format!("{}-sg", tier)))
        .with("description", format!("{} tier", tier))
        .with("vpcId", vpc.attr(attr::VPC_ID))
        .with("allowAllOutbound", true),
    )
  }

  fn add_database(
    &mut self,
    foundation: &Foundation,
    groups: &SecurityGroups,
  ) -> Result<NodeHandle, GraphError> {
    let parameters = self.graph.add_node(
      ResourceSpec::new(ids::DB_PARAMETERS, ResourceKind::Database)
        .with("family", "postgres15")
        .with("parameters", [("rds.force_ssl", "1")]),
    )?;

    self.graph.add_node(
      ResourceSpec::new(ids::OMOP_DB, ResourceKind::Database)
        .with("engine", "postgres")
        .with("engineVersion", "15.4")
        .with("instanceClass", self.sizing.db_instance_class.as_str())
        .with("allocatedStorageGib", self.sizing.db_allocated_storage_gib)
        .with("multiAz", true)
        .with("storageEncrypted", true)
        .with("kmsKeyArn", foundation.key.attr(attr::KEY_ARN))
        .with(
          "credentials",
          [
            ("username", ConfigValue::from(OMOP_DB_USER)),
            ("generateSecret", ConfigValue::from(true)),
          ],
        )
        .with("databaseName", OMOP_DB_NAME)
        .with("port", RELATIONAL_PORT)
        .with("subnetIds", foundation.vpc.attr(attr::DATA_SUBNET_IDS))
        .with("securityGroupIds", vec![groups.data.attr(attr::GROUP_ID)])
        .with(
          "parameterGroupName",
          parameters.attr(attr::PARAMETER_GROUP_NAME),
        )
        .with("backupRetentionDays", 7u32)
        .with("deletionProtection", true)
        .with("publiclyAccessible", false)
        .with("cloudwatchLogsExports", vec!["postgresql", "upgrade"])
        .with(
          "crossRegionBackups",
          self.sizing.cross_region_replication,
        ),
    )
  }

  fn add_identity(&mut self) -> Result<Identity, GraphError> {
    let pool = self.graph.add_node(
      ResourceSpec::new(ids::USER_POOL, ResourceKind::IdentityProvider)
        .with("userPoolName", self.name("users"))
        .with("selfSignUpEnabled", false)
        .with("signInAliases", vec!["email", "preferred_username"])
        .with(
          "passwordPolicy",
          [
            ("minLength", ConfigValue::from(12u32)),
            ("requireLowercase", ConfigValue::from(true)),
            ("requireUppercase", ConfigValue::from(true)),
            ("requireDigits", ConfigValue::from(true)),
            ("requireSymbols", ConfigValue::from(true)),
          ],
        )
        .with("accountRecovery", "email_only")
        .with("mfa", "required")
        .with("mfaSecondFactor", vec!["otp"])
        .with("removalPolicy", "destroy"),
    )?;

    let client = self.graph.add_node(
      ResourceSpec::new(ids::USER_POOL_CLIENT, ResourceKind::IdentityProvider)
        .with("userPoolId", pool.attr(attr::USER_POOL_ID))
        .with("generateSecret", true)
        .with("authFlows", vec!["user_srp"])
        .with("oauthFlows", vec!["authorization_code_grant"])
        .with("callbackUrls", self.config.smart_callback_urls.clone())
        .with("logoutUrls", self.config.smart_logout_urls.clone())
        .with("scopes", vec!["openid", "email", "profile"]),
    )?;

    for group in USER_GROUPS {
      self.graph.add_node(
        ResourceSpec::new(ids::user_group(group), ResourceKind::IdentityProvider)
          .with("userPoolId", pool.attr(attr::USER_POOL_ID))
          .with("groupName", group),
      )?;
    }

    Ok(Identity { pool, client })
  }

  fn add_fhir_datastore(&mut self, key: &NodeHandle) -> Result<NodeHandle, GraphError> {
    self.graph.add_node(
      ResourceSpec::new(ids::FHIR_DATASTORE, ResourceKind::DataStore)
        .with("datastoreName", self.name("fhir"))
        .with("region", self.config.health_lake_region.as_str())
        .with("datastoreTypeVersion", "R4")
        .with("preloadDataType", "SYNTHEA")
        .with(
          "sseConfiguration",
          [
            ("cmkType", ConfigValue::from("CUSTOMER_MANAGED_KMS_KEY")),
            ("kmsKeyId", ConfigValue::from(key.attr(attr::KEY_ARN))),
          ],
        )
        .with(
          "identityProviderConfiguration",
          [
            ("authorizationStrategy", ConfigValue::from("SMART_ON_FHIR")),
            ("fineGrainedAuthorizationEnabled", ConfigValue::from(true)),
            (
              "idpLambdaArn",
              ConfigValue::from(self.config.smart_authorizer_lambda_arn.as_str()),
            ),
          ],
        ),
    )
  }

  fn add_search_domain(
    &mut self,
    foundation: &Foundation,
    groups: &SecurityGroups,
  ) -> Result<NodeHandle, GraphError> {
    self.graph.add_node(
      ResourceSpec::new(ids::SEARCH_DOMAIN, ResourceKind::SearchIndex)
        .with("domainName", self.name("search"))
        .with("engineVersion", "OpenSearch_2.11")
        .with("dataNodes", self.sizing.search_data_nodes)
        .with("dataNodeInstanceType", SEARCH_INSTANCE_TYPE)
        .with("zoneAwareness", true)
        .with("subnetIds", foundation.vpc.attr(attr::DATA_SUBNET_IDS))
        .with("securityGroupIds", vec![groups.search.attr(attr::GROUP_ID)])
        .with("kmsKeyArn", foundation.key.attr(attr::KEY_ARN))
        .with("nodeToNodeEncryption", true)
        .with("enforceHttps", true)
        .with("port", SEARCH_PORT)
        .with("tlsSecurityPolicy", "Policy-Min-TLS-1-2-2019-07"),
    )
  }

  fn add_services(
    &mut self,
    foundation: &Foundation,
    groups: &SecurityGroups,
    buckets: &Buckets,
    backends: &Backends,
  ) -> Result<Services, GraphError> {
    let cluster = self.graph.add_node(
      ResourceSpec::new(ids::ECS_CLUSTER, ResourceKind::ComputeService)
        .with("clusterName", self.name("cluster"))
        .with("vpcId", foundation.vpc.attr(attr::VPC_ID))
        .with("containerInsights", true),
    )?;

    let task_role = self.graph.add_node(
      ResourceSpec::new(ids::TASK_ROLE, ResourceKind::AccessRole)
        .with("assumedBy", "ecs-tasks.amazonaws.com")
        .with("readWriteBuckets", buckets.arns())
        .with("readSecrets", vec![backends.db.attr(attr::SECRET_ARN)])
        .with("fhirDatastores", vec![backends.fhir.attr(attr::DATASTORE_ARN)])
        .with("searchDomains", vec![backends.search.attr(attr::DOMAIN_ARN)]),
    )?;

    let execution_role = self.graph.add_node(
      ResourceSpec::new(ids::EXECUTION_ROLE, ResourceKind::AccessRole)
        .with("assumedBy", "ecs-tasks.amazonaws.com")
        .with(
          "managedPolicies",
          vec!["service-role/AmazonECSTaskExecutionRolePolicy"],
        ),
    )?;

    let db_host = backends.db.attr(attr::ENDPOINT);
    let search_endpoint = Interpolation::new()
      .literal("https://")
      .deferred(backends.search.attr(attr::DOMAIN_ENDPOINT));

    let inference = self.graph.add_node(
      ResourceSpec::new(ids::INFERENCE_SERVICE, ResourceKind::ComputeService)
        .with("serviceName", self.name("inference"))
        .with("clusterArn", cluster.attr(attr::CLUSTER_ARN))
        .with("image", self.config.inference_image.as_str())
        .with("cpu", INFERENCE_CPU)
        .with("memoryMib", INFERENCE_MEMORY_MIB)
        .with("desiredCount", self.sizing.inference_desired_count)
        .with("containerPort", INFERENCE_PORT)
        .with("loadBalancerType", "network")
        .with("publicLoadBalancer", false)
        .with("listenerPort", INFERENCE_PORT)
        .with("subnetIds", foundation.vpc.attr(attr::APP_SUBNET_IDS))
        .with(
          "securityGroupIds",
          vec![groups.inference.attr(attr::GROUP_ID)],
        )
        .with(
          "logGroupName",
          foundation.inference_logs.attr(attr::LOG_GROUP_NAME),
        )
        .with("streamPrefix", "inference")
        .with("taskRoleArn", task_role.attr(attr::ROLE_ARN))
        .with("executionRoleArn", execution_role.attr(attr::ROLE_ARN))
        .with(
          "environment",
          [
            ("APP_ENV", ConfigValue::from("prod")),
            ("OMOP_DB_HOST", ConfigValue::from(db_host.clone())),
            ("SEARCH_ENDPOINT", ConfigValue::from(search_endpoint.clone())),
          ],
        ),
    )?;

    let pool = &backends.identity.pool;
    let smart_issuer = Interpolation::new()
      .literal("https://cognito-idp.")
      .deferred(pool.attr(attr::REGION))
      .literal(".amazonaws.com/")
      .deferred(pool.attr(attr::USER_POOL_ID));
    let inference_url = Interpolation::new()
      .literal("http://")
      .deferred(inference.attr(attr::LOAD_BALANCER_DNS_NAME))
      .literal(format!(":{}/insights", INFERENCE_PORT));
    let db_password = Interpolation::new()
      .deferred(backends.db.attr(attr::SECRET_ARN))
      .literal(":password::");

    let app = self.graph.add_node(
      ResourceSpec::new(ids::APP_SERVICE, ResourceKind::ComputeService)
        .with("serviceName", self.name("app"))
        .with("clusterArn", cluster.attr(attr::CLUSTER_ARN))
        .with("image", self.config.app_image.as_str())
        .with("cpu", self.sizing.app_cpu)
        .with("memoryMib", self.sizing.app_memory_mib)
        .with("desiredCount", self.sizing.app_desired_count)
        .with("protocol", "HTTPS")
        .with("listenerPort", HTTPS_PORT)
        .with("certificateArn", self.config.tls_certificate_arn.as_str())
        .with("redirectHttp", true)
        .with("circuitBreakerRollback", true)
        .with("publicLoadBalancer", false)
        .with("assignPublicIp", false)
        .with("containerPort", APP_CONTAINER_PORT)
        .with("subnetIds", foundation.vpc.attr(attr::APP_SUBNET_IDS))
        .with("securityGroupIds", vec![groups.app.attr(attr::GROUP_ID)])
        .with("logGroupName", foundation.app_logs.attr(attr::LOG_GROUP_NAME))
        .with("streamPrefix", "app")
        .with("taskRoleArn", task_role.attr(attr::ROLE_ARN))
        .with("executionRoleArn", execution_role.attr(attr::ROLE_ARN))
        .with(
          "environment",
          [
            ("APP_ENV", ConfigValue::from("prod")),
            (
              "FHIR_DATASTORE_ENDPOINT",
              ConfigValue::from(backends.fhir.attr(attr::DATASTORE_ENDPOINT)),
            ),
            (
              "FHIR_REGION",
              ConfigValue::from(self.config.health_lake_region.as_str()),
            ),
            ("SMART_ISSUER", ConfigValue::from(smart_issuer)),
            (
              "SMART_CLIENT_ID",
              ConfigValue::from(backends.identity.client.attr(attr::CLIENT_ID)),
            ),
            ("OMOP_DB_HOST", ConfigValue::from(db_host)),
            (
              "OMOP_DB_PORT",
              ConfigValue::from(backends.db.attr(attr::PORT)),
            ),
            ("OMOP_DB_NAME", ConfigValue::from(OMOP_DB_NAME)),
            ("OMOP_DB_USER", ConfigValue::from(OMOP_DB_USER)),
            ("OMOP_DB_SSLMODE", ConfigValue::from("require")),
            ("INFERENCE_URL", ConfigValue::from(inference_url)),
            ("SEARCH_ENDPOINT", ConfigValue::from(search_endpoint)),
          ],
        )
        .with("secrets", [("OMOP_DB_PASSWORD", db_password)]),
    )?;

    Ok(Services { app, inference })
  }

  fn add_etl(
    &mut self,
    composer: &mut ConditionalComposer,
    buckets: &Buckets,
  ) -> Result<Etl, StackError> {
    let config = self.config;

    let (extract, extract_spec) = composer.compose_with(
      EXTRACT_FEATURE,
      config.extraction_job(),
      |job| extraction_step(job, buckets),
      || placeholder_step(ids::EXTRACT_STEP, EXTRACT_STATE),
    )?;

    if config.batch_job_is_partial() {
      warn!(
        feature = PROCESS_FEATURE,
        "batch processing needs both batchJobDefinitionArn and batchQueueArn; using a placeholder"
      );
    }
    let (process, process_spec) = composer.compose_with(
      PROCESS_FEATURE,
      config.batch_job(),
      |job| processing_step(job, buckets),
      || placeholder_step(ids::PROCESS_STEP, PROCESS_STATE),
    )?;

    self.graph.add_node(extract_spec)?;
    self.graph.add_node(process_spec)?;
    self.graph.add_edge(ids::EXTRACT_STEP, ids::PROCESS_STEP)?;

    let assembler = WorkflowAssembler::new(format!(
      "{} omics ETL: bulk extraction then batch processing",
      config.workload_name
    ))
    .with_timeout_seconds(ETL_TIMEOUT_SECONDS);
    let workflow = assembler.assemble(extract, process);
    let definition = assembler.definition(&workflow);

    let role = self.add_etl_role(&workflow, buckets)?;

    let state_machine = self.graph.add_node(
      ResourceSpec::new(ids::OMICS_ETL, ResourceKind::StateMachine)
        .with("stateMachineName", self.name("omics-etl"))
        .with("definition", serde_json::to_string(&definition)?)
        .with("roleArn", role.attr(attr::ROLE_ARN)),
    )?;
    self.graph.add_edge(ids::EXTRACT_STEP, ids::OMICS_ETL)?;
    self.graph.add_edge(ids::PROCESS_STEP, ids::OMICS_ETL)?;

    Ok(Etl {
      workflow,
      definition,
      state_machine,
    })
  }

  /// The state machine role may start exactly the jobs present in the chain.
  fn add_etl_role(
    &mut self,
    workflow: &WorkflowStep,
    buckets: &Buckets,
  ) -> Result<NodeHandle, GraphError> {
    let jobs: Vec<_> = workflow.iter().filter_map(WorkflowStep::job).collect();
    let glue_jobs: Vec<String> = jobs
      .iter()
      .filter(|job| job.job_kind == JobKind::Glue)
      .map(|job| job.job_ref.clone())
      .collect();
    let batch_definitions: Vec<String> = jobs
      .iter()
      .filter(|job| job.job_kind == JobKind::Batch)
      .map(|job| job.job_ref.clone())
      .collect();
    let batch_queues: Vec<String> = jobs
      .iter()
      .filter_map(|job| job.job_queue.clone())
      .collect();

    self.graph.add_node(
      ResourceSpec::new(ids::ETL_ROLE, ResourceKind::AccessRole)
        .with("assumedBy", "states.amazonaws.com")
        .with("readWriteBuckets", buckets.arns())
        .with("glueJobs", glue_jobs)
        .with("batchJobDefinitions", batch_definitions)
        .with("batchJobQueues", batch_queues),
    )
  }

  fn register_outputs(
    &self,
    foundation: &Foundation,
    buckets: &Buckets,
    backends: &Backends,
    services: &Services,
    etl: &Etl,
  ) -> Result<SealedOutputs, StackError> {
    let mut outputs = OutputAggregator::new();
    outputs.register(OutputName::VpcId, foundation.vpc.attr(attr::VPC_ID))?;
    outputs.register(
      OutputName::AppUrl,
      Interpolation::new()
        .literal("https://")
        .deferred(services.app.attr(attr::LOAD_BALANCER_DNS_NAME)),
    )?;
    outputs.register(
      OutputName::InferenceNlbDns,
      services.inference.attr(attr::LOAD_BALANCER_DNS_NAME),
    )?;
    outputs.register(OutputName::DbSecret, backends.db.attr(attr::SECRET_ARN))?;
    outputs.register(
      OutputName::RawBucketName,
      buckets.raw.attr(attr::BUCKET_NAME),
    )?;
    outputs.register(
      OutputName::CuratedBucketName,
      buckets.curated.attr(attr::BUCKET_NAME),
    )?;
    outputs.register(
      OutputName::FeatureBucketName,
      buckets.feature.attr(attr::BUCKET_NAME),
    )?;
    outputs.register(
      OutputName::CognitoUserPoolId,
      backends.identity.pool.attr(attr::USER_POOL_ID),
    )?;
    outputs.register(
      OutputName::CognitoClientId,
      backends.identity.client.attr(attr::CLIENT_ID),
    )?;
    outputs.register(
      OutputName::SearchDomainEndpoint,
      backends.search.attr(attr::DOMAIN_ENDPOINT),
    )?;
    outputs.register(
      OutputName::OmicsEtlStateMachineArn,
      etl.state_machine.attr(attr::STATE_MACHINE_ARN),
    )?;
    Ok(outputs.seal()?)
  }
}

fn subnet(name: &str, subnet_type: &str) -> ConfigValue {
  ConfigValue::from([
    ("name", ConfigValue::from(name)),
    ("subnetType", ConfigValue::from(subnet_type)),
    ("cidrMask", ConfigValue::from(24u32)),
  ])
}

fn extraction_step(job_name: &str, buckets: &Buckets) -> (WorkflowStep, ResourceSpec) {
  let spec = ResourceSpec::new(ids::EXTRACT_STEP, ResourceKind::WorkflowStep)
    .with("stateName", EXTRACT_STATE)
    .with("placeholder", false)
    .with("jobKind", "glue")
    .with("jobName", job_name)
    .with(
      "arguments",
      [
        ("--source_bucket", buckets.raw.attr(attr::BUCKET_NAME)),
        ("--target_bucket", buckets.curated.attr(attr::BUCKET_NAME)),
      ],
    );
  (WorkflowStep::glue(EXTRACT_STATE, job_name), spec)
}

fn processing_step(job: BatchJobRef<'_>, buckets: &Buckets) -> (WorkflowStep, ResourceSpec) {
  let spec = ResourceSpec::new(ids::PROCESS_STEP, ResourceKind::WorkflowStep)
    .with("stateName", PROCESS_STATE)
    .with("placeholder", false)
    .with("jobKind", "batch")
    .with("jobDefinitionArn", job.job_definition_arn)
    .with("jobQueueArn", job.job_queue_arn)
    .with(
      "environment",
      [
        ("CURATED_BUCKET", buckets.curated.attr(attr::BUCKET_NAME)),
        ("FEATURE_BUCKET", buckets.feature.attr(attr::BUCKET_NAME)),
      ],
    );
  (
    WorkflowStep::batch(PROCESS_STATE, job.job_definition_arn, job.job_queue_arn),
    spec,
  )
}

/// A pass-through step: no job, no configuration that reads other nodes.
fn placeholder_step(id: &str, state: &str) -> (WorkflowStep, ResourceSpec) {
  let spec = ResourceSpec::new(id, ResourceKind::WorkflowStep)
    .with("stateName", state)
    .with("placeholder", true);
  (WorkflowStep::placeholder(state), spec)
}
