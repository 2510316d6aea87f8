//! Progress reporting

use serde::{Deserialize, Serialize};

/// Coarse lifecycle of one exploration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Loading,
    Ready,
    Error,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::Ready => "ready",
            Phase::Error => "error",
        }
    }
}

/// Receiver of traversal progress. Calls are synchronous and made in order.
pub trait StatusSink: Send {
    fn report_phase(&mut self, phase: Phase);

    fn report_progress(&mut self, message: &str);

    fn report_error(&mut self, message: &str);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStatus;

impl StatusSink for NoopStatus {
    fn report_phase(&mut self, _phase: Phase) {}

    fn report_progress(&mut self, _message: &str) {}

    fn report_error(&mut self, _message: &str) {}
}

/// Forwards reports to `tracing`
#[derive(Debug, Default)]
pub struct LogStatus {
    phase: Option<Phase>,
    steps: usize,
}

impl LogStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    /// Progress messages seen since the last `Loading` phase
    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl StatusSink for LogStatus {
    fn report_phase(&mut self, phase: Phase) {
        if phase == Phase::Loading {
            self.steps = 0;
        }
        self.phase = Some(phase);
        tracing::info!(phase = phase.name(), steps = self.steps, "Exploration phase changed");
    }

    fn report_progress(&mut self, message: &str) {
        self.steps += 1;
        tracing::info!("[{}] {}", self.steps, message);
    }

    fn report_error(&mut self, message: &str) {
        tracing::error!("{}", message);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Sink that keeps every report, for assertions
    #[derive(Debug, Default)]
    pub struct RecordingStatus {
        pub phases: Vec<Phase>,
        pub progress: Vec<String>,
        pub errors: Vec<String>,
    }

    impl StatusSink for RecordingStatus {
        fn report_phase(&mut self, phase: Phase) {
            self.phases.push(phase);
        }

        fn report_progress(&mut self, message: &str) {
            self.progress.push(message.to_string());
        }

        fn report_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_status_counts_steps() {
        let mut status = LogStatus::new();
        status.report_phase(Phase::Loading);
        status.report_progress("visiting a");
        status.report_progress("exploring t1");
        assert_eq!(status.steps(), 2);

        status.report_phase(Phase::Ready);
        assert_eq!(status.phase(), Some(Phase::Ready));

        status.report_phase(Phase::Loading);
        assert_eq!(status.steps(), 0);
    }
}
