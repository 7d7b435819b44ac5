use serde::Serialize;

use crate::stack::StackConfig;

/// Requests per second one app task is planned to absorb.
const RPS_PER_APP_TASK: u32 = 25;
/// Requests per second one search data node is planned to absorb.
const RPS_PER_SEARCH_NODE: u32 = 100;
const PATIENTS_PER_INFERENCE_TASK: u32 = 1000;
const LARGE_DB_PATIENT_THRESHOLD: u32 = 5000;
const ARCHIVE_HEAVY_OMICS_GB: u32 = 1000;

/// Capacity choices derived from the stack configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingPlan {
  pub app_cpu: u32,
  pub app_memory_mib: u32,
  pub app_desired_count: u32,
  pub inference_desired_count: u32,
  pub db_instance_class: String,
  pub db_allocated_storage_gib: u32,
  pub search_data_nodes: u32,
  pub raw_archive_after_days: u32,
  pub cross_region_replication: bool,
}

impl SizingPlan {
  pub(crate) fn derive(config: &StackConfig) -> Self {
    let replicates = config.phi_residency.replicates();

    let mut search_data_nodes = config.rps_target.div_ceil(RPS_PER_SEARCH_NODE).max(2);
    if replicates {
      search_data_nodes = search_data_nodes.max(3);
    }

    let db_instance_class = if config.daily_patients > LARGE_DB_PATIENT_THRESHOLD {
      "db.r6g.xlarge"
    } else {
      "db.t3.large"
    };

    Self {
      app_cpu: 512,
      app_memory_mib: 1024,
      app_desired_count: config.rps_target.div_ceil(RPS_PER_APP_TASK).max(2),
      inference_desired_count: config
        .daily_patients
        .div_ceil(PATIENTS_PER_INFERENCE_TASK)
        .max(1),
      db_instance_class: db_instance_class.to_string(),
      db_allocated_storage_gib: 200 + 20 * (config.daily_patients / 1000),
      search_data_nodes,
      raw_archive_after_days: if config.omics_monthly_gb >= ARCHIVE_HEAVY_OMICS_GB {
        30
      } else {
        90
      },
      cross_region_replication: replicates,
    }
  }
}
