use serde::{Deserialize, Serialize};
use std::fmt;

pub mod account;
pub mod build;
pub mod project;

pub use account::Account;
pub use build::{ArtifactsFile, Build, BuildStatus};
pub use project::Project;

pub type ProjectId = u64;
pub type BuildId = u64;

/// Identifies the target of a build action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildRef {
    pub project_id: ProjectId,
    pub build_id: BuildId,
}

impl BuildRef {
    pub fn new(project_id: ProjectId, build_id: BuildId) -> Self {
        Self {
            project_id,
            build_id,
        }
    }

    pub fn of(project: &Project, build: &Build) -> Self {
        Self::new(project.id, build.id)
    }
}

impl fmt::Display for BuildRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.build_id)
    }
}
