use std::collections::HashMap;

use crate::error::ResolveError;

/// Attributes a node reports once provisioned, keyed by attribute path.
pub type Attributes = HashMap<String, String>;

/// The producers whose attributes are available for reading.
///
/// Append-only: each producer is recorded at most once per run, so entries can
/// be read by any number of consumers once present.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSet {
  producers: HashMap<String, Attributes>,
}

impl ResolvedSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record the attributes reported by a completed producer.
  pub fn record(
    &mut self,
    producer_id: impl Into<String>,
    attributes: Attributes,
  ) -> Result<(), ResolveError> {
    let producer_id = producer_id.into();
    if self.producers.contains_key(&producer_id) {
      return Err(ResolveError::AlreadyRecorded { producer_id });
    }
    self.producers.insert(producer_id, attributes);
    Ok(())
  }

  pub fn contains(&self, producer_id: &str) -> bool {
    self.producers.contains_key(producer_id)
  }

  pub fn attributes(&self, producer_id: &str) -> Option<&Attributes> {
    self.producers.get(producer_id)
  }

  pub fn len(&self) -> usize {
    self.producers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.producers.is_empty()
  }

  pub fn producer_ids(&self) -> impl Iterator<Item = &str> {
    self.producers.keys().map(String::as_str)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_record_is_write_once() {
    let mut set = ResolvedSet::new();
    set
      .record("vpc", Attributes::from([("VpcId".to_string(), "vpc-1".to_string())]))
      .unwrap();

    let err = set.record("vpc", Attributes::new()).unwrap_err();
    assert_eq!(
      err,
      ResolveError::AlreadyRecorded {
        producer_id: "vpc".to_string()
      }
    );

    // The first entry is untouched.
    assert_eq!(
      set.attributes("vpc").and_then(|a| a.get("VpcId")),
      Some(&"vpc-1".to_string())
    );
    assert_eq!(set.len(), 1);
  }
}
