//! Progress indicators for long remote operations.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a progress bar counting geocoded addresses.
pub fn create_address_progress(total_addresses: usize, enabled: bool) -> Option<ProgressBar> {
    if !enabled || total_addresses == 0 {
        return None;
    }

    let pb = ProgressBar::new(total_addresses as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} addresses ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░ "),
    );
    Some(pb)
}

/// Create a spinner shown while a remote job runs.
pub fn create_job_spinner(message: &str, enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Finish a progress bar with a message.
pub fn finish_progress(pb: Option<ProgressBar>, message: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(message.to_string());
    }
}

/// Advance a progress bar by `n`.
pub fn inc_progress(pb: Option<&ProgressBar>, n: usize) {
    if let Some(pb) = pb {
        pb.inc(n as u64);
    }
}
