use anyhow::{Context, Result};
use directories::ProjectDirs;
use labcoat_core::Account;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const QUALIFIER: &str = "com";
const ORG: &str = "commit451";
const APP: &str = "labcoat";

/// Account storage under the platform config directory.
pub struct FilePersistence {
    root: Option<PathBuf>,
}

impl Default for FilePersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl FilePersistence {
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Store under `root` instead of the platform directory.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn config_dir(&self) -> Result<PathBuf> {
        let dir = match &self.root {
            Some(root) => root.clone(),
            None => ProjectDirs::from(QUALIFIER, ORG, APP)
                .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
                .config_dir()
                .to_path_buf(),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    fn account_path(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join("account.json"))
    }

    pub fn load_account(&self) -> Result<Option<Account>> {
        let path = self.account_path()?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).context("Failed to read account")?;
        let account: Account = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.to_string_lossy()))?;
        Ok(Some(account))
    }

    pub fn save_account(&self, account: &Account) -> Result<()> {
        let path = self.account_path()?;
        let json = serde_json::to_string_pretty(account)?;
        atomic_write(&path, json.as_bytes()).context("Failed to write account")?;
        Ok(())
    }

    pub fn clear_account(&self) -> Result<()> {
        let path = self.account_path()?;
        if path.exists() {
            fs::remove_file(&path).context("Failed to remove account")?;
        }
        Ok(())
    }
}

fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = {
        let mut name = path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    };

    let mut file = fs::File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp file {}", tmp_path.to_string_lossy()))?;

    file.write_all(contents)
        .with_context(|| format!("Failed to write temp file {}", tmp_path.to_string_lossy()))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {}", tmp_path.to_string_lossy()))?;
    drop(file);

    match fs::rename(&tmp_path, path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            fs::remove_file(path).ok();
            fs::rename(&tmp_path, path).with_context(|| {
                format!("Failed to replace destination file {}", path.to_string_lossy())
            })?;
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!(
                    "Failed to rename temp file {} to {}",
                    tmp_path.to_string_lossy(),
                    path.to_string_lossy()
                )
            });
        }
    }

    Ok(())
}
