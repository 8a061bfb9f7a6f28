//! Lifecycle controller
//!
//! Decides, for a named workload, whether to pull, create, start or remove
//! containers. Containers are matched by image reference across everything
//! the runtime reports, never by a remembered id, so leftovers from a crashed
//! run are still found and cleaned up.

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::Serialize;

use crate::error::{DmcError, Result};
use crate::launch::{self, LaunchOptions};
use crate::runtime::{ContainerRuntime, PullProgress, RuntimeContainer};
use crate::store::{CredentialStore, KEY_MOCK_POSITION};
use crate::workload::{self, ResolvedWorkload, WorkloadMode};

/// Switches for `start`
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Remove any existing container of the workload before creating
    pub recreate: bool,
    /// Disable the unless-stopped restart policy
    pub no_restart: bool,
    /// Simulation coordinates (`LAT,LNG,ALT`), stored before launch
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new container was created and started
    Started {
        container_id: String,
        image: String,
        /// Ids removed first because of `recreate`
        replaced: Vec<String>,
    },
    /// A matching container was running and `recreate` was not set
    AlreadyRunning { container_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    NotRunning,
    Removed { container_ids: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOutcome {
    pub image: String,
    pub events: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogsOutcome {
    NotFound,
    Streamed { lines: usize },
}

/// One running workload container, as shown by `ps`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadStatus {
    pub workload: String,
    pub mode: WorkloadMode,
    pub container_id: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub uptime_secs: i64,
}

/// Orchestrates workload containers over an injected runtime and store
pub struct LifecycleController<R: ContainerRuntime> {
    runtime: R,
    store: CredentialStore,
}

impl<R: ContainerRuntime> LifecycleController<R> {
    pub fn new(runtime: R, store: CredentialStore) -> Self {
        Self { runtime, store }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    fn resolve(&self, name: &str) -> Result<ResolvedWorkload> {
        workload::resolve(name)?.resolve_image(&self.store)
    }

    /// Fresh snapshot of every container running `image`
    async fn matching_containers(&self, image: &str) -> Result<Vec<RuntimeContainer>> {
        let containers = self.runtime.list_containers().await?;
        Ok(containers.into_iter().filter(|c| c.image == image).collect())
    }

    async fn remove_all(&self, containers: &[RuntimeContainer]) -> Result<Vec<String>> {
        let mut removed = Vec::with_capacity(containers.len());
        for container in containers {
            tracing::info!(container_id = %container.id, image = %container.image, "Removing container");
            self.runtime.remove_container(&container.id).await?;
            removed.push(container.id.clone());
        }
        Ok(removed)
    }

    async fn drain_pull<F>(&self, image: &str, mut on_progress: F) -> Result<usize>
    where
        F: FnMut(&PullProgress),
    {
        let mut stream = self.runtime.pull_image(image);
        let mut events = 0;
        while let Some(progress) = stream.next().await {
            let progress = progress?;
            tracing::trace!(image, status = %progress.status, "Pull progress");
            on_progress(&progress);
            events += 1;
        }
        Ok(events)
    }

    /// Pull the current image of a workload, feeding every progress event
    /// to `on_progress`. Returns once the pull has finished.
    pub async fn pull<F>(&self, name: &str, on_progress: F) -> Result<PullOutcome>
    where
        F: FnMut(&PullProgress),
    {
        let workload = self.resolve(name)?;
        tracing::info!(workload = workload.name(), image = %workload.image, "Pulling image");
        let events = self.drain_pull(&workload.image, on_progress).await?;
        Ok(PullOutcome {
            image: workload.image,
            events,
        })
    }

    /// Make sure a workload is running.
    ///
    /// A running match is left alone unless `recreate` is set. With
    /// `recreate`, every container on the workload's image is removed first,
    /// running or not. Create and start failures are returned unmodified.
    pub async fn start(&mut self, name: &str, options: &StartOptions) -> Result<StartOutcome> {
        let descriptor = workload::resolve(name)?;
        if let Some(ref location) = options.location {
            self.store.set(KEY_MOCK_POSITION, location.clone());
        }
        let workload = descriptor.resolve_image(&self.store)?;

        let existing = self.matching_containers(&workload.image).await?;
        if let Some(running) = existing.iter().find(|c| c.running) {
            if !options.recreate {
                tracing::info!(workload = name, container_id = %running.id, "Already running");
                return Ok(StartOutcome::AlreadyRunning {
                    container_id: running.id.clone(),
                });
            }
        }

        // The location is the one thing a simulation cannot run without
        if workload.mode == WorkloadMode::Simulated {
            launch::require_location(&self.store)?;
        }
        if let Some(key) = descriptor.missing_config_key(&self.store) {
            return Err(DmcError::MissingConfig(key.to_string()));
        }

        // Built before anything is removed so a bad config leaves a running
        // workload untouched.
        let spec = launch::assemble(
            &workload,
            &self.store,
            LaunchOptions {
                auto_restart: !options.no_restart,
            },
        )?;

        let replaced = if options.recreate {
            self.remove_all(&existing).await?
        } else {
            Vec::new()
        };

        if !self.runtime.image_exists(&workload.image).await? {
            tracing::info!(image = %workload.image, "Image not present, pulling");
            self.drain_pull(&workload.image, |_| {}).await?;
        }

        tracing::info!(workload = name, image = %workload.image, mode = %workload.mode, "Creating container");
        let container_id = self
            .runtime
            .create_container(workload.name(), &workload.image, &spec)
            .await?;

        tracing::info!(workload = name, container_id = %container_id, "Starting container");
        self.runtime.start_container(&container_id).await?;

        Ok(StartOutcome::Started {
            container_id,
            image: workload.image,
            replaced,
        })
    }

    /// Remove every container running the workload's image.
    /// Nothing to remove is a successful no-op.
    pub async fn stop(&self, name: &str) -> Result<StopOutcome> {
        let workload = self.resolve(name)?;
        let existing = self.matching_containers(&workload.image).await?;
        if existing.is_empty() {
            return Ok(StopOutcome::NotRunning);
        }
        let container_ids = self.remove_all(&existing).await?;
        Ok(StopOutcome::Removed { container_ids })
    }

    /// Running containers of every workload whose image can be resolved
    pub async fn status(&self) -> Result<Vec<WorkloadStatus>> {
        let containers = self.runtime.list_containers().await?;
        let now = Utc::now();
        let mut statuses = Vec::new();

        for descriptor in workload::all() {
            // An unconfigured drone has no image to match against
            let workload = match descriptor.resolve_image(&self.store) {
                Ok(workload) => workload,
                Err(DmcError::ImageNotConfigured) => continue,
                Err(e) => return Err(e),
            };
            for container in containers
                .iter()
                .filter(|c| c.running && c.image == workload.image)
            {
                statuses.push(WorkloadStatus {
                    workload: workload.name().to_string(),
                    mode: workload.mode,
                    container_id: container.id.clone(),
                    image: container.image.clone(),
                    created_at: container.created_at,
                    uptime_secs: (now - container.created_at).num_seconds().max(0),
                });
            }
        }

        Ok(statuses)
    }

    /// Stream the logs of the container named after `name`.
    /// A write error from `on_line` ends the stream.
    pub async fn logs<F>(&self, name: &str, follow: bool, mut on_line: F) -> Result<LogsOutcome>
    where
        F: FnMut(&str) -> std::io::Result<()>,
    {
        let containers = self.runtime.list_containers().await?;
        let Some(container) = containers.iter().find(|c| c.name == name) else {
            return Ok(LogsOutcome::NotFound);
        };

        let mut stream = self.runtime.container_logs(&container.id, follow);
        let mut lines = 0;
        while let Some(line) = stream.next().await {
            on_line(line?.as_str())?;
            lines += 1;
        }
        Ok(LogsOutcome::Streamed { lines })
    }
}
