use serde::Serialize;
use tracing::debug;

use crate::tier::{Protocol, Tier};

/// Postgres.
pub const RELATIONAL_PORT: u16 = 5432;
/// Inference service container port behind its load balancer.
pub const INFERENCE_PORT: u16 = 8080;
/// HTTPS to the search domain.
pub const SEARCH_PORT: u16 = 443;

/// Permission for traffic from one tier to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPolicyRule {
  pub source_tier: Tier,
  pub dest_tier: Tier,
  pub port: u16,
  pub protocol: Protocol,
}

impl SecurityPolicyRule {
  /// Stable identifier, e.g. `app-to-data-5432-tcp`.
  pub fn slug(&self) -> String {
    format!(
      "{}-to-{}-{}-{}",
      self.source_tier, self.dest_tier, self.port, self.protocol
    )
  }

  pub fn names(&self, tier: Tier) -> bool {
    self.source_tier == tier || self.dest_tier == tier
  }
}

/// Accumulates directional rules in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SecurityPolicyWirer {
  rules: Vec<SecurityPolicyRule>,
}

impl SecurityPolicyWirer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Allow `source` to reach `dest` on `port`. Only this direction.
  pub fn allow(&mut self, source: Tier, dest: Tier, port: u16, protocol: Protocol) {
    let rule = SecurityPolicyRule {
      source_tier: source,
      dest_tier: dest,
      port,
      protocol,
    };
    debug!(rule = %rule.slug(), "ingress rule wired");
    self.rules.push(rule);
  }

  /// Rules naming `tier` as source or destination, in insertion order.
  pub fn rules_for(&self, tier: Tier) -> Vec<SecurityPolicyRule> {
    self
      .rules
      .iter()
      .filter(|rule| rule.names(tier))
      .copied()
      .collect()
  }

  /// Rules letting traffic into `tier`.
  pub fn ingress_to(&self, tier: Tier) -> impl Iterator<Item = &SecurityPolicyRule> {
    self.rules.iter().filter(move |rule| rule.dest_tier == tier)
  }

  pub fn rules(&self) -> &[SecurityPolicyRule] {
    &self.rules
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }
}

/// Wire the platform's fixed communication intents.
pub fn wire_platform_intents(wirer: &mut SecurityPolicyWirer) {
  wirer.allow(Tier::App, Tier::Data, RELATIONAL_PORT, Protocol::Tcp);
  wirer.allow(Tier::App, Tier::Inference, INFERENCE_PORT, Protocol::Tcp);
  wirer.allow(Tier::Inference, Tier::Data, RELATIONAL_PORT, Protocol::Tcp);
  wirer.allow(Tier::App, Tier::Search, SEARCH_PORT, Protocol::Tcp);
  wirer.allow(Tier::Inference, Tier::Search, SEARCH_PORT, Protocol::Tcp);
}
