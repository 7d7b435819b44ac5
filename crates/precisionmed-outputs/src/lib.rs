//! Precisionmed Outputs
//!
//! Collects the fixed set of named outputs (endpoints, identifiers, ARNs) an
//! operator reads after deployment. Registration happens while the stack is
//! built; [`OutputAggregator::seal`] rejects a stack missing any output, and
//! [`SealedOutputs::collect`] reads final values from the resolved set.

mod aggregator;
mod error;
mod name;

pub use aggregator::{OutputAggregator, OutputValue, SealedOutputs, StackOutput};
pub use error::OutputError;
pub use name::OutputName;
