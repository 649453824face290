use indicatif::{ProgressBar, ProgressStyle};

use crate::stats::ChipProgress;

/// Progress bar over the chips of a statistics run
pub struct ProgressTracker {
    bar: ProgressBar,
    source: Option<usize>,
}

impl ProgressTracker {
    pub fn new(description: &str) -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        bar.set_message(description.to_string());

        ProgressTracker { bar, source: None }
    }

    /// Hidden tracker, for non-interactive runs
    pub fn hidden() -> Self {
        ProgressTracker {
            bar: ProgressBar::hidden(),
            source: None,
        }
    }

    /// Advances the bar, restarting it when a new source begins
    pub fn update(&mut self, progress: ChipProgress) {
        if self.source != Some(progress.source) {
            self.source = Some(progress.source);
            self.bar.reset();
            self.bar.set_length(progress.total as u64);
            self.bar.set_message(format!("source {}", progress.source + 1));
        }
        self.bar.set_position(progress.done as u64);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Completed");
    }
}
