//! Flush policies consulted by the scheduler loop on every iteration.
//!
//! A policy never sees items. It is told how many items are pending and what
//! time it is, and answers two questions: how the loop should wait for the
//! next item ([`Wake`]), and whether the pending batch should be flushed
//! ([`FlushDecision`]).

pub mod debounced;
pub mod fixed_tick;
pub mod greedy;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::scheduler::{Config, FlushError};

pub use debounced::DebouncedWait;
pub use fixed_tick::FixedTick;
pub use greedy::GreedyDrain;

/// How the loop waits before consulting the policy again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Poll the queue without waiting.
    Now,
    /// Wait for an item, but no later than the deadline.
    At(Instant),
    /// Wait for an item with no deadline.
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushDecision {
    Flush,
    Hold,
}

impl FlushDecision {
    #[inline]
    pub fn when(condition: bool) -> Self {
        if condition {
            FlushDecision::Flush
        } else {
            FlushDecision::Hold
        }
    }

    #[inline]
    pub fn is_flush(self) -> bool {
        self == FlushDecision::Flush
    }
}

/// What caused a batch to be handed to the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// The batch reached `max_batch_size`.
    Size,
    /// The queue went quiet or a deadline passed.
    Idle,
    /// Final flush after the queue closed or the run was cancelled.
    Drain,
}

impl fmt::Display for FlushTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlushTrigger::Size => "size",
            FlushTrigger::Idle => "idle",
            FlushTrigger::Drain => "drain",
        };
        f.write_str(name)
    }
}

/// Selects one of the built-in policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlushPolicyKind {
    GreedyDrain,
    #[default]
    DebouncedWait,
    FixedTick,
}

impl FlushPolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlushPolicyKind::GreedyDrain => "greedy-drain",
            FlushPolicyKind::DebouncedWait => "debounced-wait",
            FlushPolicyKind::FixedTick => "fixed-tick",
        }
    }
}

impl fmt::Display for FlushPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlushPolicyKind {
    type Err = FlushError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy-drain" => Ok(FlushPolicyKind::GreedyDrain),
            "debounced-wait" => Ok(FlushPolicyKind::DebouncedWait),
            "fixed-tick" => Ok(FlushPolicyKind::FixedTick),
            other => Err(FlushError::InvalidConfig(format!(
                "unknown flush policy `{other}`"
            ))),
        }
    }
}

/// Decision state machine behind the scheduler loop.
pub trait FlushPolicy: Send {
    fn kind(&self) -> FlushPolicyKind;

    /// How to wait for the next item, given `pending` buffered items.
    fn next_wake(&mut self, now: Instant, pending: usize) -> Wake;

    /// Called after an item was appended; `pending` includes it.
    fn on_item(&mut self, _now: Instant, pending: usize, max_batch_size: usize) -> FlushDecision {
        FlushDecision::when(pending >= max_batch_size)
    }

    /// Called when a wait ended without an item.
    fn on_idle_wake(&mut self, now: Instant, pending: usize) -> FlushDecision;

    /// Releases timer state. Calling it more than once is a no-op.
    fn stop(&mut self) {}
}

/// Builds the policy selected by `config`, with timers anchored at `start`.
pub fn build(config: &Config, start: Instant) -> Box<dyn FlushPolicy> {
    match config.flush_policy() {
        FlushPolicyKind::GreedyDrain => Box::new(GreedyDrain),
        FlushPolicyKind::DebouncedWait => Box::new(DebouncedWait::new(config.idle_timeout())),
        FlushPolicyKind::FixedTick => Box::new(FixedTick::new(start, config.tick_period())),
    }
}
