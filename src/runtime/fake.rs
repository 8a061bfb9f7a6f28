//! In-memory container runtime for tests

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::stream::{self, StreamExt};

use super::{ContainerRuntime, LogStream, PullProgress, PullStream, RuntimeContainer};
use crate::error::{DmcError, Result};
use crate::launch::LaunchSpec;

/// A call made against the fake, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    ImageExists(String),
    Pull(String),
    Create {
        name: String,
        image: String,
        spec: LaunchSpec,
    },
    Start(String),
    Remove(String),
    Logs(String),
}

#[derive(Debug, Default)]
struct State {
    containers: Vec<RuntimeContainer>,
    images: Vec<String>,
    next_id: u32,
    calls: Vec<Call>,
    start_error: Option<String>,
    pull_error: Option<String>,
    log_lines: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeRuntime {
    state: Mutex<State>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `image` as already present locally
    pub fn with_image(self, image: &str) -> Self {
        self.state.lock().unwrap().images.push(image.to_string());
        self
    }

    /// Seed an existing container and return its id
    pub fn add_container(&self, name: &str, image: &str, running: bool) -> String {
        let mut state = self.state.lock().unwrap();
        let id = next_id(&mut state);
        state.containers.push(RuntimeContainer {
            id: id.clone(),
            name: name.to_string(),
            image: image.to_string(),
            created_at: Utc::now(),
            running,
        });
        id
    }

    pub fn fail_start(&self, message: &str) {
        self.state.lock().unwrap().start_error = Some(message.to_string());
    }

    pub fn fail_pull(&self, message: &str) {
        self.state.lock().unwrap().pull_error = Some(message.to_string());
    }

    pub fn set_log_lines(&self, lines: &[&str]) {
        self.state.lock().unwrap().log_lines = lines.iter().map(|l| l.to_string()).collect();
    }

    pub fn containers(&self) -> Vec<RuntimeContainer> {
        self.state.lock().unwrap().containers.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn next_id(state: &mut State) -> String {
    state.next_id += 1;
    format!("container-{}", state.next_id)
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn list_containers(&self) -> Result<Vec<RuntimeContainer>> {
        self.record(Call::List);
        Ok(self.containers())
    }

    async fn image_exists(&self, image: &str) -> Result<bool> {
        self.record(Call::ImageExists(image.to_string()));
        Ok(self.state.lock().unwrap().images.iter().any(|i| i == image))
    }

    fn pull_image<'a>(&'a self, image: &'a str) -> PullStream<'a> {
        self.record(Call::Pull(image.to_string()));
        let mut state = self.state.lock().unwrap();

        let mut events = vec![
            Ok(PullProgress {
                id: None,
                status: format!("Pulling from {}", image),
                progress: None,
            }),
            Ok(PullProgress {
                id: Some("layer1".to_string()),
                status: "Downloading".to_string(),
                progress: Some("[=====>   ]".to_string()),
            }),
        ];
        match state.pull_error.clone() {
            Some(message) => events.push(Err(DmcError::Runtime {
                operation: "pull_image",
                message,
            })),
            None => state.images.push(image.to_string()),
        }

        stream::iter(events).boxed()
    }

    async fn create_container(
        &self,
        name: &str,
        image: &str,
        spec: &LaunchSpec,
    ) -> Result<String> {
        self.record(Call::Create {
            name: name.to_string(),
            image: image.to_string(),
            spec: spec.clone(),
        });
        let mut state = self.state.lock().unwrap();
        if state.containers.iter().any(|c| c.name == name) {
            return Err(DmcError::CreateConflict(name.to_string()));
        }
        let id = next_id(&mut state);
        state.containers.push(RuntimeContainer {
            id: id.clone(),
            name: name.to_string(),
            image: image.to_string(),
            created_at: Utc::now(),
            running: false,
        });
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.record(Call::Start(id.to_string()));
        let mut state = self.state.lock().unwrap();
        if let Some(message) = state.start_error.clone() {
            return Err(DmcError::StartFailed(message));
        }
        match state.containers.iter_mut().find(|c| c.id == id) {
            Some(container) => {
                container.running = true;
                Ok(())
            }
            None => Err(DmcError::StartFailed(format!("No such container: {}", id))),
        }
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        self.record(Call::Remove(id.to_string()));
        let mut state = self.state.lock().unwrap();
        let before = state.containers.len();
        state.containers.retain(|c| c.id != id);
        if state.containers.len() == before {
            return Err(DmcError::Runtime {
                operation: "remove_container",
                message: format!("No such container: {}", id),
            });
        }
        Ok(())
    }

    fn container_logs<'a>(&'a self, id: &'a str, _follow: bool) -> LogStream<'a> {
        self.record(Call::Logs(id.to_string()));
        let lines: Vec<Result<String>> = self
            .state
            .lock()
            .unwrap()
            .log_lines
            .iter()
            .cloned()
            .map(Ok)
            .collect();
        stream::iter(lines).boxed()
    }
}
