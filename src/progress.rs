use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Create a MultiProgress for parallel uploads. Hidden when `enabled` is false.
pub fn multi_progress(enabled: bool) -> MultiProgress {
    if enabled {
        MultiProgress::new()
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    }
}

/// Add a spinner to a MultiProgress for a named report.
pub fn report_spinner(mp: &MultiProgress, label: &str) -> ProgressBar {
    let pb = mp.add(ProgressBar::new_spinner());
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner} [{elapsed}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(format!("{label}: uploading..."));
    if !mp.is_hidden() {
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
    }
    pb
}
