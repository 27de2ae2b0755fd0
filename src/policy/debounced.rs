use std::time::Duration;

use tokio::time::Instant;

use super::{FlushDecision, FlushPolicy, FlushPolicyKind, Wake};

/// Races every receive against a fresh `idle_timeout` deadline.
///
/// The deadline is re-armed on each wait, so it measures the quiet period
/// since the last item rather than the age of the batch. When it expires with
/// nothing pending, the next wait is a plain blocking receive.
#[derive(Debug, Clone)]
pub struct DebouncedWait {
    idle_timeout: Duration,
    block_next: bool,
}

impl DebouncedWait {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            idle_timeout,
            block_next: false,
        }
    }

    #[inline]
    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }
}

impl FlushPolicy for DebouncedWait {
    fn kind(&self) -> FlushPolicyKind {
        FlushPolicyKind::DebouncedWait
    }

    fn next_wake(&mut self, now: Instant, _pending: usize) -> Wake {
        if std::mem::take(&mut self.block_next) {
            return Wake::Never;
        }
        Wake::At(now + self.idle_timeout)
    }

    fn on_idle_wake(&mut self, _now: Instant, pending: usize) -> FlushDecision {
        if pending == 0 {
            self.block_next = true;
        }
        FlushDecision::when(pending > 0)
    }

    fn stop(&mut self) {
        self.block_next = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(40);

    #[test]
    fn test_deadline_is_rearmed_from_now() {
        let mut policy = DebouncedWait::new(TIMEOUT);
        let start = Instant::now();

        assert_eq!(policy.next_wake(start, 0), Wake::At(start + TIMEOUT));

        let later = start + Duration::from_millis(25);
        assert_eq!(policy.next_wake(later, 3), Wake::At(later + TIMEOUT));
    }

    #[test]
    fn test_timeout_with_pending_items_flushes() {
        let mut policy = DebouncedWait::new(TIMEOUT);
        let now = Instant::now();

        assert_eq!(policy.on_idle_wake(now, 2), FlushDecision::Flush);
        assert_eq!(policy.next_wake(now, 0), Wake::At(now + TIMEOUT));
    }

    #[test]
    fn test_timeout_with_empty_batch_blocks_once() {
        let mut policy = DebouncedWait::new(TIMEOUT);
        let now = Instant::now();

        assert_eq!(policy.on_idle_wake(now, 0), FlushDecision::Hold);
        assert_eq!(policy.next_wake(now, 0), Wake::Never);
        assert_eq!(policy.next_wake(now, 1), Wake::At(now + TIMEOUT));
    }
}
