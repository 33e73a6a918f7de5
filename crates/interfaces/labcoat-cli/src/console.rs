use indicatif::{ProgressBar, ProgressStyle};
use labcoat_app_core::{BusyIndicator, NotificationSink};
use std::time::Duration;

/// Notifications go straight to stdout.
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn show(&self, message: &str) {
        println!(":: {}", message);
    }
}

/// Spinner shown while a build action is in flight.
pub struct SpinnerBusy {
    pb: ProgressBar,
}

impl SpinnerBusy {
    pub fn new(message: String) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message);
        Self { pb }
    }
}

impl BusyIndicator for SpinnerBusy {
    fn set_busy(&self, busy: bool) {
        if busy {
            self.pb.enable_steady_tick(Duration::from_millis(100));
        } else {
            self.pb.finish_and_clear();
        }
    }
}
