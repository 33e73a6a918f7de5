use labcoat_core::{Account, Build, BuildRef, Project};
use tracing::{debug, error};

use crate::action::{ActionKind, ActionRequest};
use crate::app_core::{ScreenCommand, ScreenEvent, ScreenStore};
use crate::bus::{BusEvent, BusSubscription, EventBus};
use crate::controller::BuildActionController;
use crate::domain::BuildScreenState;
use crate::ports::{BuildService, BusyIndicator, DownloadPort, NotificationSink, PermissionPort};

pub const NO_ARTIFACTS: &str = "No artifacts to download";
pub const PERMISSION_DENIED: &str = "Permission denied";
pub const DOWNLOAD_FAILED: &str = "Unable to start download";

/// Busy indicator and notification sink that write into the screen store.
#[derive(Clone)]
pub struct StoreSurface {
    store: ScreenStore,
}

impl StoreSurface {
    pub fn new(store: ScreenStore) -> Self {
        Self { store }
    }
}

impl BusyIndicator for StoreSurface {
    fn set_busy(&self, busy: bool) {
        self.store.apply(ScreenEvent::BusyChanged(busy));
    }
}

impl NotificationSink for StoreSurface {
    fn show(&self, message: &str) {
        self.store.apply(ScreenEvent::Notice(message.to_string()));
    }
}

/// Build detail screen: routes menu commands, drives the action controller and
/// follows bus updates for the displayed build.
pub struct BuildScreen<S, D, P> {
    pub store: ScreenStore,
    controller: BuildActionController<S, StoreSurface, StoreSurface>,
    subscription: BusSubscription,
    account: Account,
    downloads: D,
    permissions: P,
}

impl<S, D, P> BuildScreen<S, D, P>
where
    S: BuildService,
    D: DownloadPort,
    P: PermissionPort,
{
    pub fn open(
        project: Project,
        build: Build,
        account: Account,
        service: S,
        downloads: D,
        permissions: P,
        bus: &EventBus,
    ) -> anyhow::Result<Self> {
        let store = ScreenStore::new(BuildScreenState::new(project, build));
        let surface = StoreSurface::new(store.clone());
        let subscription = bus.subscribe();
        let controller =
            BuildActionController::new(service, surface.clone(), surface, bus.clone())?;

        Ok(Self {
            store,
            controller,
            subscription,
            account,
            downloads,
            permissions,
        })
    }

    pub fn state(&self) -> BuildScreenState {
        self.store.state()
    }

    pub fn target(&self) -> BuildRef {
        self.store.with_state(|s| s.target())
    }

    pub fn is_busy(&self) -> bool {
        self.controller.is_busy()
    }

    pub fn dispatch(&mut self, cmd: ScreenCommand) {
        match cmd {
            ScreenCommand::Perform(kind) => self.perform(kind),

            ScreenCommand::DownloadArtifacts => {
                if !self.store.with_state(|s| s.build.has_artifacts()) {
                    self.notice(NO_ARTIFACTS);
                    return;
                }
                if self.permissions.storage_granted() {
                    self.start_download();
                } else {
                    self.permissions.request_storage();
                }
            }

            ScreenCommand::PermissionResult { granted } => {
                if granted {
                    self.start_download();
                } else {
                    self.notice(PERMISSION_DENIED);
                }
            }
        }
    }

    /// Call from the UI loop to apply finished actions and bus updates.
    pub fn tick(&mut self) {
        self.controller.tick();
        self.drain_bus();
    }

    /// Await the in-flight action, then apply bus updates it produced.
    pub async fn wait_for_outcome(&mut self) -> Option<ActionKind> {
        let kind = self.controller.wait_for_outcome().await;
        self.drain_bus();
        kind
    }

    /// The screen is going away: pending outcomes are not applied.
    pub fn close(mut self) {
        self.controller.detach();
    }

    fn perform(&mut self, kind: ActionKind) {
        let request = ActionRequest::new(kind, self.target());
        if let Err(e) = self.controller.perform(request) {
            debug!("Ignoring {} trigger: {}", kind, e);
        }
    }

    fn drain_bus(&mut self) {
        while let Some(ev) = self.subscription.try_next() {
            match ev {
                BusEvent::BuildChanged { target, build } => {
                    if target == self.target() {
                        self.store.apply(ScreenEvent::BuildRefreshed(build));
                    }
                }
            }
        }
    }

    fn start_download(&mut self) {
        let (target, artifacts) = self
            .store
            .with_state(|s| (s.target(), s.build.artifacts_file.clone()));
        let Some(artifacts) = artifacts else {
            self.notice(NO_ARTIFACTS);
            return;
        };

        let url = match labcoat_infra::artifacts_url(
            &self.account,
            target.project_id,
            target.build_id,
        ) {
            Ok(url) => url,
            Err(e) => {
                error!("Cannot build artifacts url for {}: {}", target, e);
                self.notice(DOWNLOAD_FAILED);
                return;
            }
        };

        debug!("Downloading build: {}", url);
        if let Err(e) =
            self.downloads
                .request_download(&self.account, url.as_str(), &artifacts.filename)
        {
            error!("Download of {} failed to start: {:#}", url, e);
            self.notice(DOWNLOAD_FAILED);
        }
    }

    fn notice(&self, message: &str) {
        self.store.apply(ScreenEvent::Notice(message.to_string()));
    }
}
