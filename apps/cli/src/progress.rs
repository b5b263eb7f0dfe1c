//! Terminal progress bars for the pipeline stages

use absorb::{ProgressReporter, Stage};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use parking_lot::Mutex;

const BAR_TEMPLATE: &str = "{prefix:>24} [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}";
const SPINNER_TEMPLATE: &str = "{prefix:>24} {spinner:.green} {pos} {wide_msg}";

/// One bar per stage, replaced when the next stage starts
pub struct IndicatifReporter {
    progress: MultiProgress,
    current: Mutex<Option<ProgressBar>>,
}

impl IndicatifReporter {
    pub fn new(progress: MultiProgress) -> Self {
        Self {
            progress,
            current: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(bar) = self.current.lock().as_ref() {
            f(bar);
        }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, stage: Stage, total: usize) {
        // Stages with an unknown total (the file walk) get a spinner.
        let (bar, template) = if total == 0 {
            (ProgressBar::new_spinner(), SPINNER_TEMPLATE)
        } else {
            (ProgressBar::new(total as u64), BAR_TEMPLATE)
        };
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_prefix(stage.name());

        let bar = self.progress.add(bar);
        *self.current.lock() = Some(bar);
    }

    fn report(&self, current: usize, _total: usize, label: &str) {
        self.with_bar(|bar| {
            bar.set_position(current as u64);
            bar.set_message(label.to_string());
        });
    }

    fn complete(&self, _stage: Stage) {
        if let Some(bar) = self.current.lock().take() {
            bar.finish_with_message("done");
        }
    }
}
