use std::fmt;

use serde::{Deserialize, Serialize};

/// A role a component plays in the network topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
  App,
  Inference,
  Data,
  Search,
}

impl Tier {
  pub const ALL: [Tier; 4] = [Tier::App, Tier::Inference, Tier::Data, Tier::Search];

  pub fn as_str(self) -> &'static str {
    match self {
      Tier::App => "app",
      Tier::Inference => "inference",
      Tier::Data => "data",
      Tier::Search => "search",
    }
  }
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
  Tcp,
  Udp,
}

impl Protocol {
  pub fn as_str(self) -> &'static str {
    match self {
      Protocol::Tcp => "tcp",
      Protocol::Udp => "udp",
    }
  }
}

impl fmt::Display for Protocol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
