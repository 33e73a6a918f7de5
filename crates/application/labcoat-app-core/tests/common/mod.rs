#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use labcoat_app_core::{ActionKind, BuildService, BusyIndicator, NotificationSink};
use labcoat_core::{ArtifactsFile, Build, BuildId, BuildRef, BuildStatus, ProjectId};
use tokio::sync::Semaphore;

type Responder = Arc<dyn Fn(ActionKind, BuildRef) -> anyhow::Result<Build> + Send + Sync>;

pub fn build(id: u64, status: BuildStatus) -> Build {
    Build {
        id,
        status,
        name: "rspec".into(),
        stage: "test".into(),
        ref_name: "main".into(),
        created_at: None,
        started_at: None,
        finished_at: None,
        erased_at: None,
        artifacts_file: None,
    }
}

pub fn with_artifacts(mut build: Build) -> Build {
    build.artifacts_file = Some(ArtifactsFile {
        filename: "artifacts.zip".into(),
        size: 1024,
    });
    build
}

/// BuildService fake: records calls and answers once a gate permit is available.
#[derive(Clone)]
pub struct FakeService {
    pub calls: Arc<Mutex<Vec<(ActionKind, BuildRef)>>>,
    gate: Arc<Semaphore>,
    respond: Responder,
}

impl FakeService {
    pub fn new(respond: impl Fn(ActionKind, BuildRef) -> anyhow::Result<Build> + Send + Sync + 'static) -> Self {
        Self {
            calls: Arc::default(),
            gate: Arc::new(Semaphore::new(Semaphore::MAX_PERMITS)),
            respond: Arc::new(respond),
        }
    }

    pub fn succeeding(build: Build) -> Self {
        Self::new(move |_, _| Ok(build.clone()))
    }

    pub fn failing(message: &'static str) -> Self {
        Self::new(move |_, _| Err(anyhow::anyhow!(message)))
    }

    /// Calls block until `release` is called on the returned gate.
    pub fn gated(self) -> (Self, Gate) {
        let gate = Arc::new(Semaphore::new(0));
        (
            Self {
                gate: gate.clone(),
                ..self
            },
            Gate(gate),
        )
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn answer(&self, kind: ActionKind, project_id: ProjectId, build_id: BuildId) -> anyhow::Result<Build> {
        let target = BuildRef::new(project_id, build_id);
        self.calls.lock().unwrap().push((kind, target));
        let _permit = self.gate.acquire().await?;
        (self.respond)(kind, target)
    }
}

pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn release(&self) {
        self.0.add_permits(1);
    }
}

#[async_trait::async_trait]
impl BuildService for FakeService {
    async fn retry_build(&self, project_id: ProjectId, build_id: BuildId) -> anyhow::Result<Build> {
        self.answer(ActionKind::Retry, project_id, build_id).await
    }

    async fn erase_build(&self, project_id: ProjectId, build_id: BuildId) -> anyhow::Result<Build> {
        self.answer(ActionKind::Erase, project_id, build_id).await
    }

    async fn cancel_build(&self, project_id: ProjectId, build_id: BuildId) -> anyhow::Result<Build> {
        self.answer(ActionKind::Cancel, project_id, build_id).await
    }
}

/// Records busy transitions and notifications in order.
#[derive(Clone, Default)]
pub struct Surface {
    pub busy: Arc<Mutex<Vec<bool>>>,
    pub notices: Arc<Mutex<Vec<String>>>,
}

impl Surface {
    pub fn busy_log(&self) -> Vec<bool> {
        self.busy.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().unwrap().clone()
    }
}

impl BusyIndicator for Surface {
    fn set_busy(&self, busy: bool) {
        self.busy.lock().unwrap().push(busy);
    }
}

impl NotificationSink for Surface {
    fn show(&self, message: &str) {
        self.notices.lock().unwrap().push(message.to_string());
    }
}
