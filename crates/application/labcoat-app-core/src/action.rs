use std::fmt;

use labcoat_core::BuildRef;
use uuid::Uuid;

/// Tags one in-flight action so late outcomes can be told apart.
pub type ActionRunId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Retry,
    Erase,
    Cancel,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Retry, ActionKind::Erase, ActionKind::Cancel];

    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::Retry => "retry",
            ActionKind::Erase => "erase",
            ActionKind::Cancel => "cancel",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            ActionKind::Retry => "Build started",
            ActionKind::Erase => "Build erased",
            ActionKind::Cancel => "Build canceled",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            ActionKind::Retry => "Unable to retry build",
            ActionKind::Erase => "Unable to erase build",
            ActionKind::Cancel => "Unable to cancel build",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub target: BuildRef,
}

impl ActionRequest {
    pub fn new(kind: ActionKind, target: BuildRef) -> Self {
        Self { kind, target }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("an action for build {target} is already in flight")]
    Busy { target: BuildRef },
    #[error("{kind} of build {target} failed: {cause:#}")]
    RequestFailed {
        kind: ActionKind,
        target: BuildRef,
        cause: anyhow::Error,
    },
}
