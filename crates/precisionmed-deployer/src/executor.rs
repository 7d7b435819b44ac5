use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use precisionmed_graph::{Attributes, ResolvedResource, ResourceKind};
use precisionmed_stack::ids::attr;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::ProvisionError;

/// Provisions one fully resolved resource at a time.
///
/// Implementations report the attributes the resource exposes once it
/// exists; those values feed the deferred references of later nodes.
/// Retries, rate limits and timeouts are the implementation's concern.
#[async_trait]
pub trait ProvisioningExecutor: Send + Sync {
  async fn provision(&self, resource: &ResolvedResource) -> Result<Attributes, ProvisionError>;
}

/// Executor that fabricates deterministic attributes without calling any
/// cloud API. Used by `precisionmed simulate` and in tests.
#[derive(Debug)]
pub struct SimulatedExecutor {
  account: String,
  region: String,
  failing: HashSet<String>,
  provisioned: Mutex<Vec<String>>,
}

impl SimulatedExecutor {
  pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
    Self {
      account: account.into(),
      region: region.into(),
      failing: HashSet::new(),
      provisioned: Mutex::new(Vec::new()),
    }
  }

  /// Report a failure when `node_id` is provisioned.
  pub fn fail_on(mut self, node_id: impl Into<String>) -> Self {
    self.failing.insert(node_id.into());
    self
  }

  /// Node ids provisioned so far, in completion order.
  pub async fn provisioned(&self) -> Vec<String> {
    self.provisioned.lock().await.clone()
  }

  /// The attributes a resource of this kind reports.
  pub fn attributes_for(&self, resource: &ResolvedResource) -> Attributes {
    let id = resource.id.as_str();
    let token = token(id);
    let region = self.region.as_str();
    let account = self.account.as_str();

    let pairs: Vec<(&str, String)> = match resource.kind {
      ResourceKind::EncryptionKey => vec![(
        attr::KEY_ARN,
        format!("arn:aws:kms:{}:{}:key/{}", region, account, token),
      )],
      ResourceKind::Network => vec![
        (attr::VPC_ID, format!("vpc-{}", token)),
        (attr::PUBLIC_SUBNET_IDS, subnets("public", &token)),
        (attr::APP_SUBNET_IDS, subnets("app", &token)),
        (attr::DATA_SUBNET_IDS, subnets("data", &token)),
      ],
      ResourceKind::LogGroup => {
        let name = text(resource, "logGroupName").unwrap_or(id).to_string();
        vec![
          (
            attr::LOG_GROUP_ARN,
            format!("arn:aws:logs:{}:{}:log-group:{}", region, account, name),
          ),
          (attr::LOG_GROUP_NAME, name),
        ]
      }
      ResourceKind::Storage => {
        let prefix = text(resource, "bucketPrefix").unwrap_or(id);
        let name = format!("{}-{}", prefix, token);
        vec![
          (attr::BUCKET_ARN, format!("arn:aws:s3:::{}", name)),
          (attr::BUCKET_NAME, name),
        ]
      }
      ResourceKind::SecurityGroup => vec![(attr::GROUP_ID, format!("sg-{}", token))],
      ResourceKind::SecurityGroupRule => vec![(attr::RULE_ID, format!("sgr-{}", token))],
      ResourceKind::Database => {
        let port = resource
          .config
          .get("port")
          .and_then(serde_json::Value::as_u64)
          .unwrap_or(5432);
        vec![
          (attr::PARAMETER_GROUP_NAME, format!("{}-{}", id, token)),
          (
            attr::ENDPOINT,
            format!("{}.{}.{}.rds.amazonaws.com", id, token, region),
          ),
          (attr::PORT, port.to_string()),
          (
            attr::SECRET_ARN,
            format!(
              "arn:aws:secretsmanager:{}:{}:secret:{}-{}",
              region, account, id, token
            ),
          ),
        ]
      }
      ResourceKind::ComputeService => {
        let name = text(resource, "serviceName")
          .or_else(|| text(resource, "clusterName"))
          .unwrap_or(id);
        vec![
          (
            attr::CLUSTER_ARN,
            format!("arn:aws:ecs:{}:{}:cluster/{}", region, account, name),
          ),
          (
            attr::SERVICE_ARN,
            format!("arn:aws:ecs:{}:{}:service/{}", region, account, name),
          ),
          (
            attr::LOAD_BALANCER_DNS_NAME,
            format!("internal-{}-{}.{}.elb.amazonaws.com", name, token, region),
          ),
        ]
      }
      ResourceKind::AccessRole => vec![(
        attr::ROLE_ARN,
        format!("arn:aws:iam::{}:role/{}-{}", account, id, token),
      )],
      ResourceKind::IdentityProvider => {
        let pool_id = format!("{}_{}", region, token);
        vec![
          (
            attr::USER_POOL_ARN,
            format!(
              "arn:aws:cognito-idp:{}:{}:userpool/{}",
              region, account, pool_id
            ),
          ),
          (attr::USER_POOL_ID, pool_id),
          (attr::REGION, region.to_string()),
          (attr::CLIENT_ID, token.clone()),
          (
            attr::GROUP_NAME,
            text(resource, "groupName").unwrap_or(id).to_string(),
          ),
        ]
      }
      ResourceKind::DataStore => {
        let store_region = text(resource, "region").unwrap_or(region);
        vec![
          (attr::DATASTORE_ID, token.clone()),
          (
            attr::DATASTORE_ARN,
            format!(
              "arn:aws:healthlake:{}:{}:datastore/fhir/{}",
              store_region, account, token
            ),
          ),
          (
            attr::DATASTORE_ENDPOINT,
            format!(
              "https://healthlake.{}.amazonaws.com/datastore/{}/r4/",
              store_region, token
            ),
          ),
        ]
      }
      ResourceKind::SearchIndex => {
        let name = text(resource, "domainName").unwrap_or(id);
        vec![
          (
            attr::DOMAIN_ENDPOINT,
            format!("vpc-{}-{}.{}.es.amazonaws.com", name, token, region),
          ),
          (
            attr::DOMAIN_ARN,
            format!("arn:aws:es:{}:{}:domain/{}", region, account, name),
          ),
        ]
      }
      ResourceKind::WorkflowStep => vec![(
        attr::STATE_NAME,
        text(resource, "stateName").unwrap_or(id).to_string(),
      )],
      ResourceKind::StateMachine => {
        let name = text(resource, "stateMachineName").unwrap_or(id);
        vec![(
          attr::STATE_MACHINE_ARN,
          format!("arn:aws:states:{}:{}:stateMachine:{}", region, account, name),
        )]
      }
    };

    pairs
      .into_iter()
      .map(|(key, value)| (key.to_string(), value))
      .collect()
  }
}

#[async_trait]
impl ProvisioningExecutor for SimulatedExecutor {
  async fn provision(&self, resource: &ResolvedResource) -> Result<Attributes, ProvisionError> {
    if self.failing.contains(&resource.id) {
      return Err(ProvisionError::new(format!(
        "simulated failure for {:?} resource",
        resource.kind
      )));
    }

    let attributes = self.attributes_for(resource);
    debug!(node_id = %resource.id, attributes = attributes.len(), "simulated provision");
    self.provisioned.lock().await.push(resource.id.clone());
    Ok(attributes)
  }
}

fn text<'a>(resource: &'a ResolvedResource, key: &str) -> Option<&'a str> {
  resource.config.get(key).and_then(serde_json::Value::as_str)
}

/// Stable 12-hex-digit token derived from a node id.
fn token(id: &str) -> String {
  let mut hasher = DefaultHasher::new();
  id.hash(&mut hasher);
  format!("{:012x}", hasher.finish() & 0xffff_ffff_ffff)
}

fn subnets(tier: &str, token: &str) -> String {
  format!("subnet-{}-{}a,subnet-{}-{}b", tier, token, tier, token)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;

  fn resource(id: &str, kind: ResourceKind, config: serde_json::Value) -> ResolvedResource {
    let config: BTreeMap<String, serde_json::Value> = serde_json::from_value(config).unwrap();
    ResolvedResource {
      id: id.to_string(),
      kind,
      config,
    }
  }

  #[test]
  fn test_attributes_are_deterministic() {
    let executor = SimulatedExecutor::new("123456789012", "us-east-1");
    let bucket = resource(
      "raw-bucket",
      ResourceKind::Storage,
      serde_json::json!({ "bucketPrefix": "pm-raw" }),
    );

    let first = executor.attributes_for(&bucket);
    let second = executor.attributes_for(&bucket);
    assert_eq!(first, second);
    assert!(first[attr::BUCKET_NAME].starts_with("pm-raw-"));
    assert_eq!(
      first[attr::BUCKET_ARN],
      format!("arn:aws:s3:::{}", first[attr::BUCKET_NAME])
    );
  }

  #[test]
  fn test_database_reports_configured_port() {
    let executor = SimulatedExecutor::new("123456789012", "eu-west-1");
    let db = resource(
      "omop-postgres",
      ResourceKind::Database,
      serde_json::json!({ "port": 5433 }),
    );

    let attributes = executor.attributes_for(&db);
    assert_eq!(attributes[attr::PORT], "5433");
    assert!(attributes[attr::ENDPOINT].ends_with(".eu-west-1.rds.amazonaws.com"));
    assert!(attributes[attr::SECRET_ARN].starts_with("arn:aws:secretsmanager:eu-west-1:"));
  }

  #[tokio::test]
  async fn test_fail_on_reports_failure_and_skips_record() {
    let executor = SimulatedExecutor::new("123456789012", "us-east-1").fail_on("vpc");
    let vpc = resource("vpc", ResourceKind::Network, serde_json::json!({}));
    let key = resource("kms-key", ResourceKind::EncryptionKey, serde_json::json!({}));

    assert!(executor.provision(&vpc).await.is_err());
    assert!(executor.provision(&key).await.is_ok());
    assert_eq!(executor.provisioned().await, vec!["kms-key".to_string()]);
  }
}
