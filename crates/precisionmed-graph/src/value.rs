//! Configuration values, including values only known after provisioning.
//!
//! A [`DeferredValue`] names a producer node and one of the attributes it
//! reports once provisioned (an endpoint, a generated secret ARN, ...). It is
//! resolved against a [`ResolvedSet`] and caches the result; the cache is only
//! consulted once the producer is recorded in the set being resolved against.
//! A clone starts unresolved.
//!
//! An [`Interpolation`] mixes literal and deferred fragments. It resolves to a
//! single string only when every fragment resolves; a partially resolved
//! string is never produced.
//!
//! ```text
//! "https://" + ${app-service.LoadBalancerDnsName}  ->  "https://internal-app-123.elb.amazonaws.com"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use serde::{Serialize, Serializer};

use crate::error::ResolveError;
use crate::resolved::ResolvedSet;

/// A value produced by another node after it has been provisioned.
#[derive(Debug)]
pub struct DeferredValue {
  producer_id: String,
  attribute_path: String,
  cached: OnceLock<String>,
}

impl DeferredValue {
  /// Reference an attribute of a producer node.
  ///
  /// Always succeeds: the producer may be added to the graph later, and its
  /// existence is checked when the graph is frozen.
  pub fn reference(producer_id: impl Into<String>, attribute_path: impl Into<String>) -> Self {
    Self {
      producer_id: producer_id.into(),
      attribute_path: attribute_path.into(),
      cached: OnceLock::new(),
    }
  }

  pub fn producer_id(&self) -> &str {
    &self.producer_id
  }

  pub fn attribute_path(&self) -> &str {
    &self.attribute_path
  }

  /// Whether this value has been resolved.
  pub fn is_resolved(&self) -> bool {
    self.cached.get().is_some()
  }

  /// The resolved value, if resolution already happened.
  pub fn cached_value(&self) -> Option<&str> {
    self.cached.get().map(String::as_str)
  }

  /// Resolve against the set of completed producers.
  ///
  /// Fails with [`ResolveError::UnresolvedDependency`] while the producer is
  /// not in `resolved`, cached or not. On success the value is cached and
  /// never changes.
  pub fn resolve(&self, resolved: &ResolvedSet) -> Result<String, ResolveError> {
    let attributes =
      resolved
        .attributes(&self.producer_id)
        .ok_or_else(|| ResolveError::UnresolvedDependency {
          producer_id: self.producer_id.clone(),
          needed_by: format!("reference {}", self),
        })?;

    if let Some(value) = self.cached.get() {
      return Ok(value.clone());
    }

    let value = attributes
      .get(&self.attribute_path)
      .ok_or_else(|| ResolveError::MissingAttribute {
        producer_id: self.producer_id.clone(),
        attribute_path: self.attribute_path.clone(),
      })?;

    Ok(self.cached.get_or_init(|| value.clone()).clone())
  }
}

impl Clone for DeferredValue {
  fn clone(&self) -> Self {
    Self::reference(self.producer_id.clone(), self.attribute_path.clone())
  }
}

impl PartialEq for DeferredValue {
  fn eq(&self, other: &Self) -> bool {
    self.producer_id == other.producer_id && self.attribute_path == other.attribute_path
  }
}

impl Eq for DeferredValue {}

impl fmt::Display for DeferredValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "${{{}.{}}}", self.producer_id, self.attribute_path)
  }
}

impl Serialize for DeferredValue {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// One piece of an [`Interpolation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
  Literal(String),
  Deferred(DeferredValue),
}

/// A string assembled from literal and deferred fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interpolation {
  fragments: Vec<Fragment>,
}

impl Interpolation {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn literal(mut self, text: impl Into<String>) -> Self {
    self.fragments.push(Fragment::Literal(text.into()));
    self
  }

  pub fn deferred(mut self, value: DeferredValue) -> Self {
    self.fragments.push(Fragment::Deferred(value));
    self
  }

  pub fn fragments(&self) -> &[Fragment] {
    &self.fragments
  }

  /// Deferred fragments, in order.
  pub fn references(&self) -> impl Iterator<Item = &DeferredValue> {
    self.fragments.iter().filter_map(|f| match f {
      Fragment::Deferred(value) => Some(value),
      Fragment::Literal(_) => None,
    })
  }

  /// Resolve every fragment, then join.
  pub fn resolve(&self, resolved: &ResolvedSet) -> Result<String, ResolveError> {
    let parts = self
      .fragments
      .iter()
      .map(|fragment| match fragment {
        Fragment::Literal(text) => Ok(text.clone()),
        Fragment::Deferred(value) => value.resolve(resolved),
      })
      .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.concat())
  }
}

impl fmt::Display for Interpolation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for fragment in &self.fragments {
      match fragment {
        Fragment::Literal(text) => f.write_str(text)?,
        Fragment::Deferred(value) => write!(f, "{}", value)?,
      }
    }
    Ok(())
  }
}

impl Serialize for Interpolation {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// A node configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
  Text(String),
  Integer(i64),
  Flag(bool),
  List(Vec<ConfigValue>),
  Map(BTreeMap<String, ConfigValue>),
  Deferred(DeferredValue),
  Interpolated(Interpolation),
}

impl ConfigValue {
  /// Every deferred value reachable from this value.
  pub fn references(&self) -> Vec<&DeferredValue> {
    let mut out = Vec::new();
    self.collect_references(&mut out);
    out
  }

  fn collect_references<'a>(&'a self, out: &mut Vec<&'a DeferredValue>) {
    match self {
      ConfigValue::Deferred(value) => out.push(value),
      ConfigValue::Interpolated(interpolation) => out.extend(interpolation.references()),
      ConfigValue::List(items) => {
        for item in items {
          item.collect_references(out);
        }
      }
      ConfigValue::Map(entries) => {
        for item in entries.values() {
          item.collect_references(out);
        }
      }
      ConfigValue::Text(_) | ConfigValue::Integer(_) | ConfigValue::Flag(_) => {}
    }
  }

  /// Resolve into a JSON value.
  pub fn resolve(&self, resolved: &ResolvedSet) -> Result<serde_json::Value, ResolveError> {
    Ok(match self {
      ConfigValue::Text(text) => serde_json::Value::String(text.clone()),
      ConfigValue::Integer(n) => serde_json::Value::from(*n),
      ConfigValue::Flag(b) => serde_json::Value::Bool(*b),
      ConfigValue::List(items) => serde_json::Value::Array(
        items
          .iter()
          .map(|item| item.resolve(resolved))
          .collect::<Result<_, _>>()?,
      ),
      ConfigValue::Map(entries) => serde_json::Value::Object(
        entries
          .iter()
          .map(|(key, item)| item.resolve(resolved).map(|v| (key.clone(), v)))
          .collect::<Result<_, _>>()?,
      ),
      ConfigValue::Deferred(value) => serde_json::Value::String(value.resolve(resolved)?),
      ConfigValue::Interpolated(interpolation) => {
        serde_json::Value::String(interpolation.resolve(resolved)?)
      }
    })
  }
}

impl From<&str> for ConfigValue {
  fn from(value: &str) -> Self {
    ConfigValue::Text(value.to_string())
  }
}

impl From<String> for ConfigValue {
  fn from(value: String) -> Self {
    ConfigValue::Text(value)
  }
}

impl From<&String> for ConfigValue {
  fn from(value: &String) -> Self {
    ConfigValue::Text(value.clone())
  }
}

impl From<i64> for ConfigValue {
  fn from(value: i64) -> Self {
    ConfigValue::Integer(value)
  }
}

impl From<u32> for ConfigValue {
  fn from(value: u32) -> Self {
    ConfigValue::Integer(i64::from(value))
  }
}

impl From<u16> for ConfigValue {
  fn from(value: u16) -> Self {
    ConfigValue::Integer(i64::from(value))
  }
}

impl From<bool> for ConfigValue {
  fn from(value: bool) -> Self {
    ConfigValue::Flag(value)
  }
}

impl From<DeferredValue> for ConfigValue {
  fn from(value: DeferredValue) -> Self {
    ConfigValue::Deferred(value)
  }
}

impl From<Interpolation> for ConfigValue {
  fn from(value: Interpolation) -> Self {
    ConfigValue::Interpolated(value)
  }
}

impl<K: Into<String>, V: Into<ConfigValue>, const N: usize> From<[(K, V); N]> for ConfigValue {
  fn from(entries: [(K, V); N]) -> Self {
    ConfigValue::Map(
      entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect(),
    )
  }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
  fn from(values: Vec<T>) -> Self {
    ConfigValue::List(values.into_iter().map(Into::into).collect())
  }
}
