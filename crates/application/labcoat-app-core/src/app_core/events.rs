use labcoat_core::Build;

#[derive(Debug, Clone)]
pub enum ScreenEvent {
    BusyChanged(bool),

    // User-visible messages
    Notice(String),

    // A newer snapshot of the displayed build
    BuildRefreshed(Build),
}
