//! Precisionmed Workflow
//!
//! The omics ETL pipeline is a fixed chain of two steps: bulk extraction
//! followed by batch processing. Each position holds either a real job step or
//! a no-op placeholder, chosen once by the [`ConditionalComposer`] from the
//! presence of that feature's configuration.
//!
//! The assembled chain renders to a state-machine definition in which real
//! steps run synchronously (the chain only advances once the job reports
//! completion) and placeholders pass straight through.

mod chain;
mod compose;
mod error;
mod step;

pub use chain::{WorkflowAssembler, chain};
pub use compose::{ConditionalComposer, FeatureDecision, compose_optional};
pub use error::ComposeError;
pub use step::{JobKind, JobStep, StepKind, WorkflowStep};
