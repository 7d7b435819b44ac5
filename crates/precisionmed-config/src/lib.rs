//! Precisionmed Config
//!
//! This crate contains the serializable input configuration for the
//! precisionmed platform stack. These types represent the operator's intent
//! before the stack builder turns it into a resource graph.
//!
//! Configuration is loaded from JSON (via the CLI with `--config=stack.json`)
//! and validated with [`StackConfig::validate`] before any graph node exists.

mod error;
mod residency;
mod sizing;
mod stack;

pub use error::ConfigError;
pub use residency::PhiResidency;
pub use sizing::SizingPlan;
pub use stack::{BatchJobRef, StackConfig};
