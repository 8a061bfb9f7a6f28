//! Container runtime adapter
//!
//! The lifecycle controller only talks to the engine through
//! [`ContainerRuntime`]. The production implementation wraps the Docker
//! Engine API; tests use an in-memory double.

mod docker;
#[cfg(test)]
pub(crate) mod fake;

pub use docker::{DockerRuntime, DOCKER_HELP};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;

use crate::error::Result;
use crate::launch::LaunchSpec;

/// Snapshot of one container as reported by the engine.
/// Only valid for the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub running: bool,
}

/// One event from an image pull
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullProgress {
    /// Layer id, when the event concerns a single layer
    pub id: Option<String>,
    pub status: String,
    /// Progress bar text as rendered by the engine
    pub progress: Option<String>,
}

impl std::fmt::Display for PullProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.id {
            write!(f, "{}: ", id)?;
        }
        write!(f, "{}", self.status)?;
        if let Some(ref progress) = self.progress {
            write!(f, " {}", progress)?;
        }
        Ok(())
    }
}

pub type PullStream<'a> = BoxStream<'a, Result<PullProgress>>;
pub type LogStream<'a> = BoxStream<'a, Result<String>>;

/// Capabilities the lifecycle controller needs from a container engine.
///
/// Implementations report failures as-is and never retry.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// All containers, running or not
    async fn list_containers(&self) -> Result<Vec<RuntimeContainer>>;

    /// Whether `image` is present locally
    async fn image_exists(&self, image: &str) -> Result<bool>;

    /// Pull `image`; the stream ends when the pull completes or fails
    fn pull_image<'a>(&'a self, image: &'a str) -> PullStream<'a>;

    /// Create a container and return its id.
    /// Fails with `CreateConflict` if `name` is taken.
    async fn create_container(&self, name: &str, image: &str, spec: &LaunchSpec)
        -> Result<String>;

    /// Fails with `StartFailed` carrying the engine's diagnostic
    async fn start_container(&self, id: &str) -> Result<()>;

    /// Force-remove a container, stopping it if needed
    async fn remove_container(&self, id: &str) -> Result<()>;

    /// Stdout and stderr of a container
    fn container_logs<'a>(&'a self, id: &'a str, follow: bool) -> LogStream<'a>;
}
