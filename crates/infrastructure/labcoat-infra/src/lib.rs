pub mod api;
pub mod net;

// Re-exports for convenience
pub use api::{artifacts_url, ApiError, GitLabClient};
pub use net::{
    default_http_client, ArtifactDownloader, DownloadError, DownloadEvent, DownloadRequest,
    DownloadResult,
};
