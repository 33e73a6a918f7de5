use camino::Utf8PathBuf;
use futures::StreamExt;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc::Sender;
use tracing::warn;

use labcoat_config::{DOWNLOAD_ATTEMPTS, DOWNLOAD_RETRY_DELAY_MS, HTTP_TIMEOUT_SECS, USER_AGENT};

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Byte-budget limiter. Chunks larger than one second of budget are charged
/// in burst-sized pieces, since governor refuses cells above the burst.
struct ByteLimiter {
    limiter: Limiter,
    burst: u32,
}

impl ByteLimiter {
    fn per_second(bytes_per_sec: u64) -> Option<Self> {
        let burst = NonZeroU32::new(bytes_per_sec.min(u32::MAX as u64) as u32)?;
        Some(Self {
            limiter: RateLimiter::direct(Quota::per_second(burst)),
            burst: burst.get(),
        })
    }

    async fn wait_for(&self, mut bytes: usize) {
        while bytes > 0 {
            let piece = bytes.min(self.burst as usize);
            if let Some(n) = NonZeroU32::new(piece as u32) {
                if let Err(e) = self.limiter.until_n_ready(n).await {
                    warn!("Rate limiter rejected {} bytes: {}", piece, e);
                    return;
                }
            }
            bytes -= piece;
        }
    }
}

/// Shared HTTP client. Only the connect phase is bounded here so that long
/// archive downloads are not cut off; API calls set their own request timeout.
pub fn default_http_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub target_path: Utf8PathBuf,
    pub private_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub path: Utf8PathBuf,
    pub bytes_downloaded: u64,
}

#[derive(Debug)]
pub enum DownloadEvent {
    Started { total_bytes: Option<u64> },
    Progress { bytes_delta: u64 },
    Completed { success: bool },
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("download of {url} failed after {attempts} attempts: {last}")]
    Exhausted {
        url: String,
        attempts: u32,
        last: String,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct ArtifactDownloader {
    client: Client,
    attempts: u32,
    retry_delay: Duration,
    rate_limit_bytes: Option<u64>,
}

impl ArtifactDownloader {
    pub fn new(client: Client, rate_limit_bytes: Option<u64>) -> Self {
        Self {
            client,
            attempts: DOWNLOAD_ATTEMPTS,
            retry_delay: Duration::from_millis(DOWNLOAD_RETRY_DELAY_MS),
            rate_limit_bytes,
        }
    }

    pub fn with_attempts(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Stream `req.url` into `req.target_path`, going through a `.part` file.
    /// A `Completed` event is sent on every exit path.
    pub async fn download(
        &self,
        req: DownloadRequest,
        progress_tx: Option<Sender<DownloadEvent>>,
    ) -> Result<DownloadResult, DownloadError> {
        let result = self.run(req, progress_tx.as_ref()).await;
        emit(
            progress_tx.as_ref(),
            DownloadEvent::Completed {
                success: result.is_ok(),
            },
        )
        .await;
        result
    }

    async fn run(
        &self,
        req: DownloadRequest,
        progress_tx: Option<&Sender<DownloadEvent>>,
    ) -> Result<DownloadResult, DownloadError> {
        let limiter = self.rate_limit_bytes.and_then(ByteLimiter::per_second);

        if let Some(parent) = req.target_path.parent() {
            if !parent.as_str().is_empty() {
                tokio::fs::create_dir_all(parent.as_std_path()).await?;
            }
        }
        let tmp_path = req.target_path.with_extension("part");

        let mut last = String::new();
        for attempt in 1..=self.attempts {
            match self
                .try_once(&req, &tmp_path, progress_tx, limiter.as_ref())
                .await
            {
                Ok(bytes) => {
                    tokio::fs::rename(tmp_path.as_std_path(), req.target_path.as_std_path())
                        .await?;
                    return Ok(DownloadResult {
                        path: req.target_path.clone(),
                        bytes_downloaded: bytes,
                    });
                }
                Err(e) => {
                    warn!(
                        "Download attempt {}/{} for {} failed: {}",
                        attempt, self.attempts, req.url, e
                    );
                    last = e;
                }
            }
            if attempt < self.attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        let _ = tokio::fs::remove_file(tmp_path.as_std_path()).await;

        Err(DownloadError::Exhausted {
            url: req.url,
            attempts: self.attempts,
            last,
        })
    }

    async fn try_once(
        &self,
        req: &DownloadRequest,
        tmp_path: &Utf8PathBuf,
        tx: Option<&Sender<DownloadEvent>>,
        lim: Option<&ByteLimiter>,
    ) -> Result<u64, String> {
        let mut builder = self.client.get(&req.url);
        if let Some(token) = &req.private_token {
            builder = builder.header("PRIVATE-TOKEN", token);
        }
        let resp = builder.send().await.map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("server returned {}", resp.status()));
        }

        emit(
            tx,
            DownloadEvent::Started {
                total_bytes: resp.content_length(),
            },
        )
        .await;

        let mut file = File::create(tmp_path.as_std_path())
            .await
            .map_err(|e| format!("create {tmp_path}: {e}"))?;
        let mut stream = resp.bytes_stream();

        let mut total_written = 0u64;
        let mut accumulated = 0u64;
        let mut last_emit = Instant::now();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            if let Some(l) = lim {
                l.wait_for(chunk.len()).await;
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| format!("write {tmp_path}: {e}"))?;

            let len = chunk.len() as u64;
            total_written += len;
            accumulated += len;

            if accumulated > 1_000_000 || last_emit.elapsed().as_millis() > 100 {
                emit(tx, DownloadEvent::Progress { bytes_delta: accumulated }).await;
                accumulated = 0;
                last_emit = Instant::now();
            }
        }

        if accumulated > 0 {
            emit(tx, DownloadEvent::Progress { bytes_delta: accumulated }).await;
        }

        file.flush().await.map_err(|e| e.to_string())?;
        Ok(total_written)
    }
}

async fn emit(tx: Option<&Sender<DownloadEvent>>, ev: DownloadEvent) {
    if let Some(t) = tx {
        let _ = t.send(ev).await;
    }
}
