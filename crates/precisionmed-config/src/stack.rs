use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::residency::PhiResidency;
use crate::sizing::SizingPlan;

/// Inputs consumed by the stack builder at graph-construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
  /// Prefix for every resource name and identifier.
  pub workload_name: String,
  pub health_lake_region: String,
  #[serde(default)]
  pub phi_residency: PhiResidency,

  // Capacity planning inputs. These change sizing, never graph shape.
  pub rps_target: u32,
  pub daily_patients: u32,
  pub omics_monthly_gb: u32,

  pub tls_certificate_arn: String,
  pub smart_callback_urls: Vec<String>,
  #[serde(default)]
  pub smart_logout_urls: Vec<String>,
  pub smart_authorizer_lambda_arn: String,

  pub app_image: String,
  pub inference_image: String,

  /// Enables the bulk-extraction workflow step.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub glue_job_name: Option<String>,
  /// Enables the batch-processing step together with `batch_queue_arn`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub batch_job_definition_arn: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub batch_queue_arn: Option<String>,
}

/// Job definition and queue for the batch-processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchJobRef<'a> {
  pub job_definition_arn: &'a str,
  pub job_queue_arn: &'a str,
}

impl StackConfig {
  /// Parse a configuration from a JSON document.
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
  }

  /// Read and parse a JSON configuration file.
  pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path)
      .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
    Self::from_json(&content)
  }

  /// Check every required field.
  ///
  /// Optional workflow fields are never an error here: the composer decides
  /// per feature whether they are complete enough to build a real step.
  pub fn validate(&self) -> Result<(), ConfigError> {
    validate_workload_name(&self.workload_name)?;
    require_non_blank("healthLakeRegion", &self.health_lake_region)?;
    require_arn("tlsCertificateArn", &self.tls_certificate_arn)?;
    require_arn("smartAuthorizerLambdaArn", &self.smart_authorizer_lambda_arn)?;

    if self.smart_callback_urls.is_empty() {
      return Err(ConfigError::invalid(
        "smartCallbackUrls",
        "at least one callback URL is required",
      ));
    }
    require_no_blank_entries("smartCallbackUrls", &self.smart_callback_urls)?;
    require_no_blank_entries("smartLogoutUrls", &self.smart_logout_urls)?;

    require_non_blank("appImage", &self.app_image)?;
    require_non_blank("inferenceImage", &self.inference_image)?;

    if self.rps_target == 0 {
      return Err(ConfigError::invalid("rpsTarget", "must be greater than zero"));
    }

    Ok(())
  }

  /// The Glue job name, if the bulk-extraction step is configured.
  pub fn extraction_job(&self) -> Option<&str> {
    present(&self.glue_job_name)
  }

  /// The batch job reference, only when both the definition and the queue are set.
  pub fn batch_job(&self) -> Option<BatchJobRef<'_>> {
    match (
      present(&self.batch_job_definition_arn),
      present(&self.batch_queue_arn),
    ) {
      (Some(job_definition_arn), Some(job_queue_arn)) => Some(BatchJobRef {
        job_definition_arn,
        job_queue_arn,
      }),
      _ => None,
    }
  }

  /// True when exactly one of the two batch fields is set.
  pub fn batch_job_is_partial(&self) -> bool {
    present(&self.batch_job_definition_arn).is_some() != present(&self.batch_queue_arn).is_some()
  }

  /// Sizing derived from the capacity inputs.
  pub fn sizing(&self) -> SizingPlan {
    SizingPlan::derive(self)
  }
}

fn present(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn validate_workload_name(name: &str) -> Result<(), ConfigError> {
  if name.trim().is_empty() {
    return Err(ConfigError::invalid("workloadName", "must not be empty"));
  }
  let valid = name
    .chars()
    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
  if !valid || name.starts_with('-') || name.ends_with('-') {
    return Err(ConfigError::invalid(
      "workloadName",
      "must contain only lowercase letters, digits and inner hyphens",
    ));
  }
  Ok(())
}

fn require_non_blank(field: &str, value: &str) -> Result<(), ConfigError> {
  if value.trim().is_empty() {
    return Err(ConfigError::invalid(field, "must not be empty"));
  }
  Ok(())
}

fn require_arn(field: &str, value: &str) -> Result<(), ConfigError> {
  require_non_blank(field, value)?;
  if !value.starts_with("arn:") {
    return Err(ConfigError::invalid(field, format!("'{}' is not an ARN", value)));
  }
  Ok(())
}

fn require_no_blank_entries(field: &str, values: &[String]) -> Result<(), ConfigError> {
  if let Some(index) = values.iter().position(|v| v.trim().is_empty()) {
    return Err(ConfigError::invalid(
      field,
      format!("entry {} is empty", index),
    ));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  const MINIMAL: &str = r#"{
    "workloadName": "precisionmed",
    "healthLakeRegion": "us-east-1",
    "phiResidency": "single-region",
    "rpsTarget": 50,
    "dailyPatients": 500,
    "omicsMonthlyGb": 500,
    "tlsCertificateArn": "arn:aws:acm:us-east-1:123456789012:certificate/abc",
    "smartCallbackUrls": ["https://app.precisionmed.health/smart/callback"],
    "smartLogoutUrls": ["https://app.precisionmed.health/logout"],
    "smartAuthorizerLambdaArn": "arn:aws:lambda:us-east-1:123456789012:function:SMARTAuthHandler:PROD",
    "appImage": "123456789012.dkr.ecr.us-east-1.amazonaws.com/precisionmed-app:latest",
    "inferenceImage": "123456789012.dkr.ecr.us-east-1.amazonaws.com/precisionmed-inference:latest"
  }"#;

  fn minimal() -> StackConfig {
    StackConfig::from_json(MINIMAL).unwrap()
  }

  #[test]
  fn test_parse_minimal_config() {
    let config = minimal();
    assert_eq!(config.workload_name, "precisionmed");
    assert_eq!(config.phi_residency, PhiResidency::SingleRegion);
    assert!(config.glue_job_name.is_none());
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_parse_multi_region_residency() {
    let json = MINIMAL.replace("single-region", "multi-region-dr");
    let config = StackConfig::from_json(&json).unwrap();
    assert_eq!(config.phi_residency, PhiResidency::MultiRegionDr);
    assert!(config.phi_residency.replicates());
  }

  #[test]
  fn test_parse_rejects_unknown_residency() {
    let json = MINIMAL.replace("single-region", "everywhere");
    assert!(matches!(
      StackConfig::from_json(&json),
      Err(ConfigError::Parse(_))
    ));
  }

  #[test]
  fn test_empty_callback_urls_rejected() {
    let mut config = minimal();
    config.smart_callback_urls.clear();
    let err = config.validate().unwrap_err();
    assert!(matches!(
      err,
      ConfigError::InvalidConfig { ref field, .. } if field == "smartCallbackUrls"
    ));
  }

  #[test]
  fn test_blank_logout_url_rejected() {
    let mut config = minimal();
    config.smart_logout_urls.push("  ".to_string());
    let err = config.validate().unwrap_err();
    assert!(matches!(
      err,
      ConfigError::InvalidConfig { ref field, .. } if field == "smartLogoutUrls"
    ));
  }

  #[test]
  fn test_missing_certificate_arn_rejected() {
    let mut config = minimal();
    config.tls_certificate_arn = String::new();
    let err = config.validate().unwrap_err();
    assert!(matches!(
      err,
      ConfigError::InvalidConfig { ref field, .. } if field == "tlsCertificateArn"
    ));
  }

  #[test]
  fn test_authorizer_must_be_arn() {
    let mut config = minimal();
    config.smart_authorizer_lambda_arn = "SMARTAuthHandler".to_string();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_workload_name_charset() {
    let mut config = minimal();
    config.workload_name = "Precision_Med".to_string();
    assert!(config.validate().is_err());

    config.workload_name = "-pm".to_string();
    assert!(config.validate().is_err());

    config.workload_name = "pm-2".to_string();
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_optional_jobs_absent_by_default() {
    let config = minimal();
    assert_eq!(config.extraction_job(), None);
    assert_eq!(config.batch_job(), None);
    assert!(!config.batch_job_is_partial());
  }

  #[test]
  fn test_blank_glue_job_counts_as_absent() {
    let mut config = minimal();
    config.glue_job_name = Some("   ".to_string());
    assert_eq!(config.extraction_job(), None);

    config.glue_job_name = Some("etl-v1".to_string());
    assert_eq!(config.extraction_job(), Some("etl-v1"));
  }

  #[test]
  fn test_batch_job_requires_both_fields() {
    let mut config = minimal();
    config.batch_job_definition_arn = Some("arn:job-def".to_string());
    assert_eq!(config.batch_job(), None);
    assert!(config.batch_job_is_partial());

    config.batch_queue_arn = Some("arn:queue".to_string());
    let job = config.batch_job().unwrap();
    assert_eq!(job.job_definition_arn, "arn:job-def");
    assert_eq!(job.job_queue_arn, "arn:queue");
    assert!(!config.batch_job_is_partial());
  }

  #[test]
  fn test_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MINIMAL.as_bytes()).unwrap();

    let config = StackConfig::from_path(file.path()).unwrap();
    assert_eq!(config.health_lake_region, "us-east-1");
  }

  #[test]
  fn test_from_missing_path() {
    let result = StackConfig::from_path(Path::new("/nonexistent/stack.json"));
    assert!(matches!(result, Err(ConfigError::Parse(_))));
  }
}
