use labcoat_core::{Account, Build, BuildId, ProjectId};
use labcoat_infra::GitLabClient;

use crate::ports::BuildService;

/// `BuildService` backed by the REST API.
pub struct GitLabBuildService {
    api: GitLabClient,
}

impl GitLabBuildService {
    pub fn new(api: GitLabClient) -> Self {
        Self { api }
    }

    pub fn for_account(account: &Account) -> anyhow::Result<Self> {
        let client = labcoat_infra::default_http_client()?;
        Ok(Self::new(GitLabClient::new(client, account)?))
    }
}

#[async_trait::async_trait]
impl BuildService for GitLabBuildService {
    async fn retry_build(&self, project_id: ProjectId, build_id: BuildId) -> anyhow::Result<Build> {
        Ok(self.api.retry_build(project_id, build_id).await?)
    }

    async fn erase_build(&self, project_id: ProjectId, build_id: BuildId) -> anyhow::Result<Build> {
        Ok(self.api.erase_build(project_id, build_id).await?)
    }

    async fn cancel_build(
        &self,
        project_id: ProjectId,
        build_id: BuildId,
    ) -> anyhow::Result<Build> {
        Ok(self.api.cancel_build(project_id, build_id).await?)
    }
}
