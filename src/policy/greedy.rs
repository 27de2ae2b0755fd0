use tokio::time::Instant;

use super::{FlushDecision, FlushPolicy, FlushPolicyKind, Wake};

/// Flushes as soon as the queue is momentarily empty.
///
/// With an empty batch the loop blocks on the queue. With a non-empty batch
/// it only polls, and an empty poll flushes whatever is pending. A slow,
/// steady producer therefore yields many single-item batches.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyDrain;

impl FlushPolicy for GreedyDrain {
    fn kind(&self) -> FlushPolicyKind {
        FlushPolicyKind::GreedyDrain
    }

    fn next_wake(&mut self, _now: Instant, pending: usize) -> Wake {
        if pending == 0 { Wake::Never } else { Wake::Now }
    }

    fn on_idle_wake(&mut self, _now: Instant, pending: usize) -> FlushDecision {
        FlushDecision::when(pending > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_only_with_empty_batch() {
        let mut policy = GreedyDrain;
        let now = Instant::now();

        assert_eq!(policy.next_wake(now, 0), Wake::Never);
        assert_eq!(policy.next_wake(now, 1), Wake::Now);
        assert_eq!(policy.next_wake(now, 499), Wake::Now);
    }

    #[test]
    fn test_empty_poll_flushes_partial_batch() {
        let mut policy = GreedyDrain;
        let now = Instant::now();

        assert_eq!(policy.on_idle_wake(now, 1), FlushDecision::Flush);
        assert_eq!(policy.on_idle_wake(now, 0), FlushDecision::Hold);
    }
}
