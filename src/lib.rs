//! dmctl - control Drone Mission Control containers
//!
//! dmctl manages the lifecycle of the `drone` and `sim` workloads on the
//! local Docker engine, plus the credentials needed to configure them.
//!
//! # Example
//!
//! ```no_run
//! use dmctl::{CredentialStore, DockerRuntime, LifecycleController, StartOptions};
//!
//! # async fn demo() -> dmctl::Result<()> {
//! let store = CredentialStore::load(dmctl::store::default_config_path()?)?;
//! let runtime = DockerRuntime::connect().await?;
//! let mut controller = LifecycleController::new(runtime, store);
//! controller.start("drone", &StartOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod error;
pub mod launch;
pub mod lifecycle;
pub mod logging;
pub mod output;
pub mod runtime;
pub mod store;
pub mod workload;

pub use error::{DmcError, Result};
pub use launch::{LaunchOptions, LaunchSpec};
pub use lifecycle::{LifecycleController, StartOptions, StartOutcome, StopOutcome};
pub use output::{format_status, OutputFormat};
pub use runtime::{ContainerRuntime, DockerRuntime};
pub use store::CredentialStore;
pub use workload::{WorkloadDescriptor, WorkloadMode};
