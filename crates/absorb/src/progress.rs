//! Progress reporting for the pipeline stages
//!
//! Reporters are push-only observers: each stage calls `start`, then `report`
//! as it advances, then `complete`. Nothing a reporter does feeds back into
//! the pipeline.

use std::sync::Arc;
use tracing::{debug, info};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Stage {
    ScanFiles,
    ScanPackages,
    ScanScenes,
    MatchFiles,
    UpdateScenes,
    DeleteFiles,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::ScanFiles => "Scan files",
            Stage::ScanPackages => "Scan var packages",
            Stage::ScanScenes => "Scan scenes",
            Stage::MatchFiles => "Match files to packages",
            Stage::UpdateScenes => "Update scene references",
            Stage::DeleteFiles => "Delete matched files",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Observer notified as stages advance. `total` is 0 when unknown.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, _stage: Stage, _total: usize) {}
    fn report(&self, _current: usize, _total: usize, _label: &str) {}
    fn complete(&self, _stage: Stage) {}
}

/// Shared handle passed into every stage
pub type SharedProgress = Arc<dyn ProgressReporter>;

/// Reporter that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {}

/// Reporter that forwards events to `tracing`
#[derive(Debug, Default)]
pub struct LogProgressReporter;

impl ProgressReporter for LogProgressReporter {
    fn start(&self, stage: Stage, total: usize) {
        if total > 0 {
            info!("{}: {} items", stage, total);
        } else {
            info!("{}...", stage);
        }
    }

    fn report(&self, current: usize, total: usize, label: &str) {
        if total > 0 {
            let percent = current as f64 / total as f64 * 100.0;
            debug!("{} / {} ({:.0}%): {}", current, total, percent, label);
        } else {
            debug!("{}: {}", current, label);
        }
    }

    fn complete(&self, stage: Stage) {
        debug!("{} complete", stage);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use parking_lot::Mutex;

    /// Event captured by [`RecordingProgress`]
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Recorded {
        Start(Stage, usize),
        Report(usize, usize, String),
        Complete(Stage),
    }

    /// Helper reporter to capture progress events during testing
    #[derive(Debug, Default)]
    pub struct RecordingProgress {
        pub events: Mutex<Vec<Recorded>>,
    }

    impl RecordingProgress {
        pub fn events(&self) -> Vec<Recorded> {
            self.events.lock().clone()
        }

        pub fn reports(&self) -> usize {
            self.events
                .lock()
                .iter()
                .filter(|e| matches!(e, Recorded::Report(..)))
                .count()
        }
    }

    impl ProgressReporter for RecordingProgress {
        fn start(&self, stage: Stage, total: usize) {
            self.events.lock().push(Recorded::Start(stage, total));
        }

        fn report(&self, current: usize, total: usize, label: &str) {
            self.events
                .lock()
                .push(Recorded::Report(current, total, label.to_string()));
        }

        fn complete(&self, stage: Stage) {
            self.events.lock().push(Recorded::Complete(stage));
        }
    }
}
