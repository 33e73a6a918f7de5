use anyhow::Result;
use std::sync::OnceLock;
use tokio::runtime::Handle;

static RUNTIME: OnceLock<std::result::Result<tokio::runtime::Runtime, String>> = OnceLock::new();

fn runtime() -> Result<&'static tokio::runtime::Runtime> {
    match RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .thread_name("labcoat-io")
            .enable_all()
            .build()
            .map_err(|e| e.to_string())
    }) {
        Ok(rt) => Ok(rt),
        Err(message) => Err(anyhow::anyhow!(message.clone())),
    }
}

/// Handle of the ambient tokio runtime, or of the process-wide fallback when
/// called from plain threads (UI loops).
pub(crate) fn handle() -> Result<Handle> {
    match Handle::try_current() {
        Ok(h) => Ok(h),
        Err(_) => Ok(runtime()?.handle().clone()),
    }
}
