use camino::Utf8PathBuf;
use labcoat_core::Account;
use labcoat_infra::{ArtifactDownloader, DownloadEvent, DownloadRequest};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::ports::DownloadPort;

/// Fire-and-forget artifact downloads into one directory.
pub struct ArtifactDownloadImpl {
    downloader: Arc<ArtifactDownloader>,
    target_dir: Utf8PathBuf,
    progress: Option<mpsc::Sender<DownloadEvent>>,
}

impl ArtifactDownloadImpl {
    pub fn new(client: reqwest::Client, target_dir: Utf8PathBuf) -> Self {
        Self {
            downloader: Arc::new(ArtifactDownloader::new(client, None)),
            target_dir,
            progress: None,
        }
    }

    pub fn with_downloader(downloader: ArtifactDownloader, target_dir: Utf8PathBuf) -> Self {
        Self {
            downloader: Arc::new(downloader),
            target_dir,
            progress: None,
        }
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<DownloadEvent>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn target_dir(&self) -> &Utf8PathBuf {
        &self.target_dir
    }

    /// Where an archive named `filename` ends up.
    pub fn target_path(&self, filename: &str) -> anyhow::Result<Utf8PathBuf> {
        Ok(self.target_dir.join(sanitize_filename(filename)?))
    }
}

impl DownloadPort for ArtifactDownloadImpl {
    fn request_download(&self, account: &Account, url: &str, filename: &str) -> anyhow::Result<()> {
        let req = DownloadRequest {
            url: url.to_string(),
            target_path: self.target_path(filename)?,
            private_token: Some(account.private_token.clone()),
        };

        let downloader = self.downloader.clone();
        let progress = self.progress.clone();
        crate::async_runtime::handle()?.spawn(async move {
            match downloader.download(req, progress).await {
                Ok(res) => info!(
                    "Downloaded {} bytes to {}",
                    res.bytes_downloaded, res.path
                ),
                Err(e) => error!("Artifact download failed: {}", e),
            }
        });
        Ok(())
    }
}

/// Default target: the user's download directory, else the working directory.
pub fn default_download_dir() -> Utf8PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(|p| p.to_path_buf()))
        .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

fn sanitize_filename(filename: &str) -> anyhow::Result<&str> {
    let name = filename.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        anyhow::bail!("refusing to write artifact to unsafe file name {filename:?}");
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_cannot_escape_target_dir() {
        assert_eq!(sanitize_filename(" artifacts.zip ").unwrap(), "artifacts.zip");
        assert!(sanitize_filename("../etc/passwd").is_err());
        assert!(sanitize_filename("a\\b.zip").is_err());
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("").is_err());
    }
}
