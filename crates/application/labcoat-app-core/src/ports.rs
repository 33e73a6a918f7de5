use labcoat_core::{Account, Build, BuildId, ProjectId};

/// Remote build operations. Each call resolves to the build's post-action state.
#[async_trait::async_trait]
pub trait BuildService: Send + Sync + 'static {
    async fn retry_build(&self, project_id: ProjectId, build_id: BuildId) -> anyhow::Result<Build>;
    async fn erase_build(&self, project_id: ProjectId, build_id: BuildId) -> anyhow::Result<Build>;
    async fn cancel_build(&self, project_id: ProjectId, build_id: BuildId)
        -> anyhow::Result<Build>;
}

/// Transient user-visible messages.
pub trait NotificationSink {
    fn show(&self, message: &str);
}

/// The visible "action in progress" signal of a screen.
pub trait BusyIndicator {
    fn set_busy(&self, busy: bool);
}

pub trait DownloadPort: Send + Sync + 'static {
    fn request_download(&self, account: &Account, url: &str, filename: &str)
        -> anyhow::Result<()>;
}

/// Platform storage permission. `request_storage` is answered later through
/// `ScreenCommand::PermissionResult`.
pub trait PermissionPort {
    fn storage_granted(&self) -> bool;
    fn request_storage(&self);
}
