use std::fmt;

use thiserror::Error;

use super::config::ConfigBuilderError;
use crate::policy::FlushTrigger;

/// Errors that can occur while running the scheduler.
#[derive(Debug, Error)]
pub enum FlushError {
    /// The batch processor failed.
    ///
    /// The batch is not redelivered; the source error is preserved.
    #[error("processor failed")]
    ProcessorError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The configuration was rejected before the loop started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ConfigBuilderError> for FlushError {
    fn from(err: ConfigBuilderError) -> Self {
        FlushError::InvalidConfig(err.to_string())
    }
}

/// States of the scheduler loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Accumulating,
    Flushing,
    Draining,
    Terminated,
}

impl SchedulerState {
    pub fn can_transition_to(self, next: SchedulerState) -> bool {
        use SchedulerState::*;
        matches!(
            (self, next),
            (Accumulating, Flushing)
                | (Flushing, Accumulating)
                | (Accumulating, Draining)
                | (Accumulating, Terminated)
                | (Flushing, Terminated)
                | (Draining, Terminated)
        )
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Accumulating => "accumulating",
            SchedulerState::Flushing => "flushing",
            SchedulerState::Draining => "draining",
            SchedulerState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Processor invocations.
    pub batches: usize,
    /// Items handed to the processor.
    pub items: usize,
    pub size_flushes: usize,
    pub idle_flushes: usize,
    pub drain_flushes: usize,
    pub largest_batch: usize,
    /// The run ended through the cancellation token.
    pub cancelled: bool,
}

impl FlushReport {
    pub(crate) fn record(&mut self, trigger: FlushTrigger, size: usize) {
        self.batches += 1;
        self.items += size;
        self.largest_batch = self.largest_batch.max(size);
        match trigger {
            FlushTrigger::Size => self.size_flushes += 1,
            FlushTrigger::Idle => self.idle_flushes += 1,
            FlushTrigger::Drain => self.drain_flushes += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_processor_error_preserves_source() {
        let source = std::io::Error::other("disk full");
        let err = FlushError::ProcessorError(Box::new(source));

        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "processor failed");
    }

    #[test]
    fn test_invalid_config_display() {
        let err = FlushError::InvalidConfig("max_batch_size must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "invalid configuration: max_batch_size must be positive"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_terminated_is_final() {
        for next in [
            SchedulerState::Accumulating,
            SchedulerState::Flushing,
            SchedulerState::Draining,
            SchedulerState::Terminated,
        ] {
            assert!(!SchedulerState::Terminated.can_transition_to(next));
        }
        assert!(SchedulerState::Accumulating.can_transition_to(SchedulerState::Flushing));
        assert!(!SchedulerState::Draining.can_transition_to(SchedulerState::Flushing));
    }

    #[test]
    fn test_report_counts_triggers() {
        let mut report = FlushReport::default();
        report.record(FlushTrigger::Size, 500);
        report.record(FlushTrigger::Size, 500);
        report.record(FlushTrigger::Drain, 200);

        assert_eq!(report.batches, 3);
        assert_eq!(report.items, 1200);
        assert_eq!(report.size_flushes, 2);
        assert_eq!(report.idle_flushes, 0);
        assert_eq!(report.drain_flushes, 1);
        assert_eq!(report.largest_batch, 500);
    }
}
