use serde::{Deserialize, Serialize};

/// Where protected health information may live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhiResidency {
  /// All PHI stays in the primary region.
  #[default]
  SingleRegion,
  /// PHI is replicated to a disaster-recovery region.
  MultiRegionDr,
}

impl PhiResidency {
  /// Whether buckets and backups replicate across regions.
  pub fn replicates(self) -> bool {
    matches!(self, PhiResidency::MultiRegionDr)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      PhiResidency::SingleRegion => "single-region",
      PhiResidency::MultiRegionDr => "multi-region-dr",
    }
  }
}
