//! Precisionmed Stack
//!
//! Builds the full platform resource graph from a [`StackConfig`]:
//! encryption key and network, storage buckets, per-tier security groups and
//! their directional ingress rules, the OMOP database, identity, the FHIR
//! datastore, search, the app and inference services, and the omics ETL
//! workflow. The optional workflow steps are decided once by a
//! `ConditionalComposer`; the eleven stack outputs are registered and sealed
//! before the stack is returned.
//!
//! [`StackConfig`]: precisionmed_config::StackConfig

mod builder;
mod error;
pub mod ids;
mod stack;

pub use builder::{EXTRACT_FEATURE, EXTRACT_STATE, PROCESS_FEATURE, PROCESS_STATE, build_stack};
pub use error::StackError;
pub use stack::{DeploymentPlan, Stack};
