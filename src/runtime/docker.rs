//! Docker Engine implementation of [`ContainerRuntime`]

use async_trait::async_trait;
use bollard::errors::Error as BollardError;
use bollard::models::{
    ContainerCreateBody, ContainerSummary, HostConfig, RestartPolicy as DockerRestartPolicy,
    RestartPolicyNameEnum,
};
use bollard::query_parameters::{
    CreateContainerOptionsBuilder, CreateImageOptionsBuilder, ListContainersOptionsBuilder,
    LogsOptionsBuilder, RemoveContainerOptionsBuilder, StartContainerOptions,
};
use bollard::Docker;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;

use super::{ContainerRuntime, LogStream, PullProgress, PullStream, RuntimeContainer};
use crate::error::{DmcError, Result};
use crate::launch::{HostSettings, LaunchSpec, RestartPolicy};

/// Printed when the engine cannot be reached at all
pub const DOCKER_HELP: &str = "\
Docker is necessary in order to run Drone Mission Control onboard software.

If docker is not installed, please install it by following the instructions at: https://docs.docker.com/install/

If docker is running, you might need to run this CLI as sudo. You can also add permissions for the current user to use docker:

  sudo usermod -aG docker USER

Note that these changes require logout to take affect.";

/// Connection to the local Docker engine
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using `DOCKER_HOST` or the platform default socket and make
    /// sure the engine answers.
    pub async fn connect() -> Result<Self> {
        let docker = Docker::connect_with_defaults()
            .map_err(|e| DmcError::RuntimeUnreachable(e.to_string()))?;
        docker
            .ping()
            .await
            .map_err(|e| DmcError::RuntimeUnreachable(e.to_string()))?;
        tracing::debug!("Connected to docker");
        Ok(Self { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn list_containers(&self) -> Result<Vec<RuntimeContainer>> {
        let options = ListContainersOptionsBuilder::new().all(true).build();
        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| operation_error("list_containers", e))?;
        Ok(summaries.into_iter().filter_map(to_runtime_container).collect())
    }

    async fn image_exists(&self, image: &str) -> Result<bool> {
        match self.docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(e) if status_code(&e) == Some(404) => Ok(false),
            Err(e) => Err(operation_error("inspect_image", e)),
        }
    }

    fn pull_image<'a>(&'a self, image: &'a str) -> PullStream<'a> {
        let (from_image, tag) = split_image_tag(image);
        let options = CreateImageOptionsBuilder::new()
            .from_image(from_image)
            .tag(tag)
            .build();

        self.docker
            .create_image(Some(options), None, None)
            .map(|item| {
                item.map(|info| PullProgress {
                    id: info.id,
                    status: info.status.unwrap_or_default(),
                    progress: info.progress,
                })
                .map_err(|e| operation_error("pull_image", e))
            })
            .boxed()
    }

    async fn create_container(
        &self,
        name: &str,
        image: &str,
        spec: &LaunchSpec,
    ) -> Result<String> {
        let body = ContainerCreateBody {
            image: Some(image.to_string()),
            env: if spec.env.is_empty() {
                None
            } else {
                Some(spec.env.clone())
            },
            cmd: if spec.command.is_empty() {
                None
            } else {
                Some(spec.command.clone())
            },
            tty: Some(true),
            host_config: Some(host_config(&spec.host)),
            ..ContainerCreateBody::default()
        };
        let options = CreateContainerOptionsBuilder::new().name(name).build();

        match self.docker.create_container(Some(options), body).await {
            Ok(response) => Ok(response.id),
            Err(e) if status_code(&e) == Some(409) => {
                Err(DmcError::CreateConflict(name.to_string()))
            }
            Err(e) => Err(operation_error("create_container", e)),
        }
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions>)
            .await
            .map_err(|e| DmcError::StartFailed(engine_message(&e)))
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        let options = RemoveContainerOptionsBuilder::new().force(true).build();
        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| operation_error("remove_container", e))
    }

    fn container_logs<'a>(&'a self, id: &'a str, follow: bool) -> LogStream<'a> {
        let options = LogsOptionsBuilder::new()
            .stdout(true)
            .stderr(true)
            .follow(follow)
            .build();

        self.docker
            .logs(id, Some(options))
            .map(|item| {
                item.map(|output| output.to_string())
                    .map_err(|e| operation_error("logs", e))
            })
            .boxed()
    }
}

fn host_config(host: &HostSettings) -> HostConfig {
    HostConfig {
        privileged: Some(host.privileged),
        network_mode: host.network_mode.clone(),
        restart_policy: host.restart_policy.map(|policy| DockerRestartPolicy {
            name: Some(match policy {
                RestartPolicy::No => RestartPolicyNameEnum::NO,
                RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
            }),
            maximum_retry_count: None,
        }),
        ..HostConfig::default()
    }
}

fn to_runtime_container(summary: ContainerSummary) -> Option<RuntimeContainer> {
    let id = summary.id?;
    let name = summary
        .names
        .and_then(|names| names.into_iter().next())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_default();
    let created_at = summary
        .created
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_default();
    let running = summary
        .state
        .as_ref()
        .map(|state| state.to_string() == "running")
        .unwrap_or(false);

    Some(RuntimeContainer {
        id,
        name,
        image: summary.image.unwrap_or_default(),
        created_at,
        running,
    })
}

/// Split `repo[:tag]`, ignoring a colon that belongs to a registry port
fn split_image_tag(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((repo, tag)) if !tag.contains('/') => (repo, tag),
        _ => (image, "latest"),
    }
}

fn status_code(error: &BollardError) -> Option<u16> {
    match error {
        BollardError::DockerResponseServerError { status_code, .. } => Some(*status_code),
        _ => None,
    }
}

fn engine_message(error: &BollardError) -> String {
    match error {
        BollardError::DockerResponseServerError { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

fn operation_error(operation: &'static str, error: BollardError) -> DmcError {
    tracing::debug!(operation, error = %error, "Docker call failed");
    DmcError::Runtime {
        operation,
        message: engine_message(&error),
    }
}
