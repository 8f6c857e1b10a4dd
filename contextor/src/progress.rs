//! Terminal feedback while a question is being answered.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Stage reporting hooks called by [`crate::ask`].
pub trait Progress: Send + Sync {
    /// A new stage started.
    fn step(&self, _stage: &str) {}
    /// The answer is ready; remove any UI.
    fn finish(&self) {}
}

/// Silent reporter for batch runs and tests.
#[derive(Default, Clone, Copy)]
pub struct NoopProgress;
impl Progress for NoopProgress {}

/// Spinner on stderr showing the current stage and elapsed time.
pub struct IndicatifProgress {
    pb: ProgressBar,
}

impl IndicatifProgress {
    pub fn spinner() -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }
}

impl Progress for IndicatifProgress {
    fn step(&self, stage: &str) {
        self.pb.set_message(stage.to_string());
    }

    fn finish(&self) {
        self.pb.finish_and_clear();
    }
}
