//! Precisionmed Deployer
//!
//! Provisions a frozen [`DeploymentPlan`](precisionmed_stack::DeploymentPlan)
//! through a [`ProvisioningExecutor`]:
//! - Ready nodes are resolved and dispatched concurrently, one batch at a time
//! - Reported attributes go into a write-once resolved set
//! - Any node failure halts the deployment without retry
//! - Cancellation is honored between batches and while a batch is in flight

mod deployer;
mod error;
mod events;
mod executor;

pub use deployer::{Deployer, DeploymentResult};
pub use error::{DeployError, ProvisionError};
pub use events::{ChannelNotifier, DeploymentEvent, DeploymentNotifier, NoopNotifier};
pub use executor::{ProvisioningExecutor, SimulatedExecutor};
