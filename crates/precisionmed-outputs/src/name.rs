use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::OutputError;

/// The outputs every deployment reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum OutputName {
  VpcId,
  AppUrl,
  InferenceNlbDns,
  DbSecret,
  RawBucketName,
  CuratedBucketName,
  FeatureBucketName,
  CognitoUserPoolId,
  CognitoClientId,
  SearchDomainEndpoint,
  OmicsEtlStateMachineArn,
}

impl OutputName {
  pub const ALL: [OutputName; 11] = [
    OutputName::VpcId,
    OutputName::AppUrl,
    OutputName::InferenceNlbDns,
    OutputName::DbSecret,
    OutputName::RawBucketName,
    OutputName::CuratedBucketName,
    OutputName::FeatureBucketName,
    OutputName::CognitoUserPoolId,
    OutputName::CognitoClientId,
    OutputName::SearchDomainEndpoint,
    OutputName::OmicsEtlStateMachineArn,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OutputName::VpcId => "VpcId",
      OutputName::AppUrl => "AppUrl",
      OutputName::InferenceNlbDns => "InferenceNlbDns",
      OutputName::DbSecret => "DbSecret",
      OutputName::RawBucketName => "RawBucketName",
      OutputName::CuratedBucketName => "CuratedBucketName",
      OutputName::FeatureBucketName => "FeatureBucketName",
      OutputName::CognitoUserPoolId => "CognitoUserPoolId",
      OutputName::CognitoClientId => "CognitoClientId",
      OutputName::SearchDomainEndpoint => "SearchDomainEndpoint",
      OutputName::OmicsEtlStateMachineArn => "OmicsEtlStateMachineArn",
    }
  }
}

impl fmt::Display for OutputName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OutputName {
  type Err = OutputError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    OutputName::ALL
      .into_iter()
      .find(|name| name.as_str() == s)
      .ok_or_else(|| OutputError::UnknownOutput {
        name: s.to_string(),
      })
  }
}
