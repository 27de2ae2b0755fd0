use std::time::Duration;

use tokio::time::Instant;

use super::{FlushDecision, FlushPolicy, FlushPolicyKind, Wake};

/// Flushes on a fixed schedule that ignores flush events.
///
/// Ticks fall at `start + n * period`. A size-triggered flush does not move
/// the schedule, so a partial batch never waits longer than one period.
/// Ticks missed while the processor was busy are skipped.
#[derive(Debug, Clone)]
pub struct FixedTick {
    period: Duration,
    next_tick: Option<Instant>,
}

impl FixedTick {
    pub fn new(start: Instant, period: Duration) -> Self {
        Self {
            period,
            next_tick: Some(start + period),
        }
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Next scheduled tick, `None` once stopped.
    #[inline]
    pub fn next_tick(&self) -> Option<Instant> {
        self.next_tick
    }

    pub fn is_stopped(&self) -> bool {
        self.next_tick.is_none()
    }

    /// Moves the schedule to the first tick strictly after `now`.
    fn advance(&mut self, now: Instant) {
        let Some(tick) = self.next_tick else {
            return;
        };
        if tick > now {
            return;
        }

        let period = self.period.as_nanos().max(1);
        let missed = (now - tick).as_nanos() / period + 1;
        let offset = u64::try_from(period.saturating_mul(missed))
            .map(Duration::from_nanos)
            .unwrap_or(Duration::MAX);
        self.next_tick = Some(tick.checked_add(offset).unwrap_or(now + self.period));
    }
}

impl FlushPolicy for FixedTick {
    fn kind(&self) -> FlushPolicyKind {
        FlushPolicyKind::FixedTick
    }

    fn next_wake(&mut self, _now: Instant, _pending: usize) -> Wake {
        match self.next_tick {
            Some(tick) => Wake::At(tick),
            None => Wake::Never,
        }
    }

    fn on_idle_wake(&mut self, now: Instant, pending: usize) -> FlushDecision {
        match self.next_tick {
            Some(tick) if tick <= now => {
                self.advance(now);
                FlushDecision::when(pending > 0)
            }
            _ => FlushDecision::Hold,
        }
    }

    fn stop(&mut self) {
        self.next_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(100);

    #[test]
    fn test_first_tick_is_one_period_after_start() {
        let start = Instant::now();
        let mut policy = FixedTick::new(start, PERIOD);
        assert_eq!(policy.next_wake(start, 0), Wake::At(start + PERIOD));
    }

    #[test]
    fn test_size_flush_does_not_move_schedule() {
        let start = Instant::now();
        let mut policy = FixedTick::new(start, PERIOD);

        let mid = start + Duration::from_millis(60);
        assert_eq!(policy.on_item(mid, 500, 500), FlushDecision::Flush);

        assert_eq!(policy.next_wake(mid, 0), Wake::At(start + PERIOD));
    }

    #[test]
    fn test_tick_flushes_and_advances() {
        let start = Instant::now();
        let mut policy = FixedTick::new(start, PERIOD);

        let tick = start + PERIOD;
        assert_eq!(policy.on_idle_wake(tick, 50), FlushDecision::Flush);
        assert_eq!(policy.next_tick(), Some(start + PERIOD * 2));

        let second = start + PERIOD * 2;
        assert_eq!(policy.on_idle_wake(second, 0), FlushDecision::Hold);
        assert_eq!(policy.next_tick(), Some(start + PERIOD * 3));
    }

    #[test]
    fn test_missed_ticks_are_skipped() {
        let start = Instant::now();
        let mut policy = FixedTick::new(start, PERIOD);

        let late = start + Duration::from_millis(350);
        assert_eq!(policy.on_idle_wake(late, 1), FlushDecision::Flush);
        assert_eq!(policy.next_tick(), Some(start + PERIOD * 4));
    }

    #[test]
    fn test_long_stall_with_tiny_period_skips_in_one_step() {
        let start = Instant::now();
        let period = Duration::from_nanos(1);
        let mut policy = FixedTick::new(start, period);

        let stalled = start + Duration::from_secs(5);
        assert_eq!(policy.on_idle_wake(stalled, 1), FlushDecision::Flush);
        assert_eq!(policy.next_tick(), Some(stalled + period));
    }

    #[test]
    fn test_wake_exactly_on_tick_moves_one_period() {
        let start = Instant::now();
        let mut policy = FixedTick::new(start, PERIOD);

        let tick = start + PERIOD * 3;
        assert_eq!(policy.on_idle_wake(tick, 2), FlushDecision::Flush);
        assert_eq!(policy.next_tick(), Some(start + PERIOD * 4));
    }

    #[test]
    fn test_early_wake_holds() {
        let start = Instant::now();
        let mut policy = FixedTick::new(start, PERIOD);

        let early = start + Duration::from_millis(10);
        assert_eq!(policy.on_idle_wake(early, 5), FlushDecision::Hold);
        assert_eq!(policy.next_tick(), Some(start + PERIOD));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let start = Instant::now();
        let mut policy = FixedTick::new(start, PERIOD);

        policy.stop();
        policy.stop();
        assert!(policy.is_stopped());
        assert_eq!(policy.next_wake(start, 3), Wake::Never);
        assert_eq!(
            policy.on_idle_wake(start + PERIOD, 3),
            FlushDecision::Hold
        );
    }
}
