//! Stable node ids and the attributes each node reports once provisioned.

pub const KMS_KEY: &str = "kms-key";
pub const VPC: &str = "vpc";
pub const APP_LOGS: &str = "app-logs";
pub const INFERENCE_LOGS: &str = "inference-logs";

pub const RAW_BUCKET: &str = "raw-bucket";
pub const CURATED_BUCKET: &str = "curated-bucket";
pub const FEATURE_BUCKET: &str = "feature-bucket";

pub const APP_SG: &str = "app-sg";
pub const INFERENCE_SG: &str = "inference-sg";
pub const DATA_SG: &str = "data-sg";
pub const SEARCH_SG: &str = "search-sg";

pub const DB_PARAMETERS: &str = "db-parameters";
pub const OMOP_DB: &str = "omop-postgres";

pub const ECS_CLUSTER: &str = "ecs-cluster";
pub const TASK_ROLE: &str = "task-role";
pub const EXECUTION_ROLE: &str = "execution-role";
pub const INFERENCE_SERVICE: &str = "inference-service";
pub const APP_SERVICE: &str = "app-service";

pub const USER_POOL: &str = "cognito-pool";
pub const USER_POOL_CLIENT: &str = "cognito-client";

pub const FHIR_DATASTORE: &str = "fhir-datastore";
pub const SEARCH_DOMAIN: &str = "search-domain";

pub const ETL_ROLE: &str = "etl-role";
pub const EXTRACT_STEP: &str = "etl-extract-step";
pub const PROCESS_STEP: &str = "etl-batch-step";
pub const OMICS_ETL: &str = "omics-etl";

/// Id of the ingress-rule node for a policy rule slug.
pub fn ingress_rule(slug: &str) -> String {
  format!("ingress-{}", slug)
}

/// Id of a user-pool group node.
pub fn user_group(group: &str) -> String {
  format!("cognito-group-{}", group)
}

/// Attribute names reported by provisioned nodes.
pub mod attr {
  pub const KEY_ARN: &str = "KeyArn";
  pub const VPC_ID: &str = "VpcId";
  pub const PUBLIC_SUBNET_IDS: &str = "PublicSubnetIds";
  pub const APP_SUBNET_IDS: &str = "AppSubnetIds";
  pub const DATA_SUBNET_IDS: &str = "DataSubnetIds";
  pub const LOG_GROUP_NAME: &str = "LogGroupName";
  pub const LOG_GROUP_ARN: &str = "LogGroupArn";
  pub const BUCKET_NAME: &str = "BucketName";
  pub const BUCKET_ARN: &str = "BucketArn";
  pub const GROUP_ID: &str = "GroupId";
  pub const RULE_ID: &str = "RuleId";
  pub const PARAMETER_GROUP_NAME: &str = "ParameterGroupName";
  pub const ENDPOINT: &str = "Endpoint";
  pub const PORT: &str = "Port";
  pub const SECRET_ARN: &str = "SecretArn";
  pub const CLUSTER_ARN: &str = "ClusterArn";
  pub const ROLE_ARN: &str = "RoleArn";
  pub const SERVICE_ARN: &str = "ServiceArn";
  pub const LOAD_BALANCER_DNS_NAME: &str = "LoadBalancerDnsName";
  pub const USER_POOL_ID: &str = "UserPoolId";
  pub const USER_POOL_ARN: &str = "UserPoolArn";
  pub const REGION: &str = "Region";
  pub const CLIENT_ID: &str = "ClientId";
  pub const GROUP_NAME: &str = "GroupName";
  pub const DATASTORE_ID: &str = "DatastoreId";
  pub const DATASTORE_ARN: &str = "DatastoreArn";
  pub const DATASTORE_ENDPOINT: &str = "DatastoreEndpoint";
  pub const DOMAIN_ENDPOINT: &str = "DomainEndpoint";
  pub const DOMAIN_ARN: &str = "DomainArn";
  pub const STATE_NAME: &str = "StateName";
  pub const STATE_MACHINE_ARN: &str = "StateMachineArn";
}
