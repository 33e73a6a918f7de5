use std::time::Duration;

use labcoat_config::{DEFAULT_API_PREFIX, HTTP_TIMEOUT_SECS};
use labcoat_core::{Account, Build, BuildId, ProjectId};
use reqwest::{Client, Method, Url};
use tracing::debug;

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// REST client for the build (job) endpoints of one account.
#[derive(Clone)]
pub struct GitLabClient {
    client: Client,
    base: Url,
    token: String,
}

impl GitLabClient {
    pub fn new(client: Client, account: &Account) -> Result<Self, ApiError> {
        Self::with_prefix(client, account, DEFAULT_API_PREFIX)
    }

    pub fn with_prefix(client: Client, account: &Account, prefix: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client,
            base: api_base_url(account, prefix)?,
            token: account.private_token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn build_url(
        &self,
        project_id: ProjectId,
        build_id: BuildId,
        suffix: Option<&str>,
    ) -> Result<Url, ApiError> {
        job_url(&self.base, project_id, build_id, suffix)
    }

    pub fn artifacts_url(&self, project_id: ProjectId, build_id: BuildId) -> Result<Url, ApiError> {
        self.build_url(project_id, build_id, Some("artifacts"))
    }

    pub async fn get_build(&self, project_id: ProjectId, build_id: BuildId) -> Result<Build, ApiError> {
        let url = self.build_url(project_id, build_id, None)?;
        self.send_for_build(Method::GET, url).await
    }

    pub async fn retry_build(
        &self,
        project_id: ProjectId,
        build_id: BuildId,
    ) -> Result<Build, ApiError> {
        self.post_build_action(project_id, build_id, "retry").await
    }

    pub async fn erase_build(
        &self,
        project_id: ProjectId,
        build_id: BuildId,
    ) -> Result<Build, ApiError> {
        self.post_build_action(project_id, build_id, "erase").await
    }

    pub async fn cancel_build(
        &self,
        project_id: ProjectId,
        build_id: BuildId,
    ) -> Result<Build, ApiError> {
        self.post_build_action(project_id, build_id, "cancel").await
    }

    async fn post_build_action(
        &self,
        project_id: ProjectId,
        build_id: BuildId,
        action: &str,
    ) -> Result<Build, ApiError> {
        let url = self.build_url(project_id, build_id, Some(action))?;
        self.send_for_build(Method::POST, url).await
    }

    async fn send_for_build(&self, method: Method, url: Url) -> Result<Build, ApiError> {
        debug!("{} {}", method, url);
        let resp = self
            .client
            .request(method, url)
            .header(TOKEN_HEADER, &self.token)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).trim().to_string(),
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn api_base_url(account: &Account, prefix: &str) -> Result<Url, ApiError> {
    let raw = labcoat_config::api_base(&account.server_url, prefix);
    Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))
}

fn job_url(
    base: &Url,
    project_id: ProjectId,
    build_id: BuildId,
    suffix: Option<&str>,
) -> Result<Url, ApiError> {
    let path = match suffix {
        Some(s) => format!("projects/{project_id}/jobs/{build_id}/{s}"),
        None => format!("projects/{project_id}/jobs/{build_id}"),
    };
    base.join(&path)
        .map_err(|e| ApiError::InvalidUrl(format!("{path} against {base}: {e}")))
}

/// Location of a build's artifact archive for `account`, without needing a client.
pub fn artifacts_url(
    account: &Account,
    project_id: ProjectId,
    build_id: BuildId,
) -> Result<Url, ApiError> {
    let base = api_base_url(account, DEFAULT_API_PREFIX)?;
    job_url(&base, project_id, build_id, Some("artifacts"))
}
