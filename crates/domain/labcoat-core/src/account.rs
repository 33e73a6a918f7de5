use serde::{Deserialize, Serialize};

/// Credentials for one server. Persisted by the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub server_url: String,
    pub private_token: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl Account {
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.server_url.trim();
        if url.is_empty() {
            anyhow::bail!("Server URL cannot be empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("Server URL must start with http:// or https://");
        }
        if self.private_token.trim().is_empty() {
            anyhow::bail!("Private token cannot be empty");
        }
        Ok(())
    }
}
