use beadscope_core::pipeline::{AnalysisStage, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter that drives a terminal progress bar.
///
/// Stages with a known item count show a bar; the rest show a spinner.
pub struct BarProgressReporter {
    pb: ProgressBar,
}

impl BarProgressReporter {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{msg:24} [{bar:40}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        Self { pb }
    }

    pub fn finish(&self) {
        self.pb.finish_with_message("Done");
    }
}

impl ProgressReporter for BarProgressReporter {
    fn begin_stage(&self, stage: AnalysisStage, total_items: Option<usize>) {
        self.pb.set_message(stage.to_string());
        self.pb.set_length(total_items.unwrap_or(1) as u64);
        self.pb.set_position(0);
    }

    fn advance(&self, items_done: usize) {
        self.pb.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(len) = self.pb.length() {
            self.pb.set_position(len);
        }
    }
}
