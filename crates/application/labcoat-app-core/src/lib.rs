pub mod action;
mod async_runtime;
pub mod app_core;
pub mod bus;
pub mod controller;
pub mod domain;
pub mod download;
pub mod gitlab;
pub mod persistence;
pub mod ports;
pub mod screen;

pub use action::{ActionError, ActionKind, ActionRequest, ActionRunId};
pub use app_core::*;
pub use bus::{BusEvent, BusSubscription, EventBus};
pub use controller::BuildActionController;
pub use domain::BuildScreenState;
pub use download::ArtifactDownloadImpl;
pub use gitlab::GitLabBuildService;
pub use ports::*;
pub use screen::{BuildScreen, StoreSurface};
