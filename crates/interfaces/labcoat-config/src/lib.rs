//! Central configuration constants for runtime limits and defaults.

/// REST API path appended to an account's server URL.
pub const DEFAULT_API_PREFIX: &str = "api/v4";

/// Capacity of a controller's outcome queue.
pub const OUTCOME_QUEUE_CAPACITY: usize = 100;

/// Capacity of the application event bus. Slow subscribers past this lag.
pub const EVENT_BUS_CAPACITY: usize = 64;

/// Request timeout for API calls (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Attempts made for one artifact download before giving up.
pub const DOWNLOAD_ATTEMPTS: u32 = 3;

/// Pause between download attempts (milliseconds).
pub const DOWNLOAD_RETRY_DELAY_MS: u64 = 500;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("labcoat/", env!("CARGO_PKG_VERSION"));

/// Join a server URL and an API prefix into the API base, with a trailing slash.
pub fn api_base(server_url: &str, prefix: &str) -> String {
    let server = server_url.trim().trim_end_matches('/');
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{server}/")
    } else {
        format!("{server}/{prefix}/")
    }
}
