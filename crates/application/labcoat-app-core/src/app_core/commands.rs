use crate::action::ActionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenCommand {
    // Menu actions
    Perform(ActionKind),
    DownloadArtifacts,

    // Platform callbacks
    PermissionResult { granted: bool },
}
