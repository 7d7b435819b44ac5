//! Precisionmed Policy
//!
//! Derives directional network-access rules between the tiers of the
//! platform. A rule from tier A to tier B never implies B to A; two-way
//! traffic takes two explicit [`SecurityPolicyWirer::allow`] calls.

mod tier;
mod wirer;

pub use tier::{Protocol, Tier};
pub use wirer::{
  INFERENCE_PORT, RELATIONAL_PORT, SEARCH_PORT, SecurityPolicyRule, SecurityPolicyWirer,
  wire_platform_intents,
};
