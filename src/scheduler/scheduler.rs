use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::accumulator::Accumulator;
use super::config::Config;
use super::processor::Processor;
use super::types::{FlushError, FlushReport, SchedulerState};
use crate::policy::{self, FlushPolicy, FlushTrigger, Wake};
use crate::queue::{self, ItemQueue, Producer, TryReceive};

/// Groups queued items into batches and hands them to a processor.
///
/// A batch is flushed when it reaches `max_batch_size` or when the configured
/// flush policy decides the queue has been quiet long enough. One batch is in
/// flight at a time.
pub struct Scheduler<T> {
    config: Arc<Config>,
    queue: ItemQueue<T>,
}

enum Event<T> {
    Item(T),
    Idle,
    Closed,
    Cancelled,
}

impl<T> From<Option<T>> for Event<T> {
    fn from(item: Option<T>) -> Self {
        match item {
            Some(item) => Event::Item(item),
            None => Event::Closed,
        }
    }
}

/// Stops the policy's timer on every exit path, including early returns and
/// a dropped `run` future.
struct PolicyGuard(Box<dyn FlushPolicy>);

impl Deref for PolicyGuard {
    type Target = dyn FlushPolicy;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl DerefMut for PolicyGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut()
    }
}

impl Drop for PolicyGuard {
    fn drop(&mut self) {
        self.0.stop();
    }
}

impl<T> Scheduler<T>
where
    T: Send + 'static,
{
    pub fn new(config: Arc<Config>, queue: ItemQueue<T>) -> Self {
        Self { config, queue }
    }

    /// Creates the scheduler together with the producer feeding it.
    ///
    /// # Panics
    ///
    /// Panics if `config.queue_capacity()` is `Some(0)`, which a built or
    /// deserialized [`Config`] never is.
    pub fn with_producer(config: Arc<Config>) -> (Producer<T>, Self) {
        let (producer, queue) = queue::channel(config.queue_capacity());
        (producer, Self::new(config, queue))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the loop until the producer finishes or `cancel` fires.
    ///
    /// Any remainder is flushed before returning. A processor error stops the
    /// loop immediately and is returned; the failed batch is not retried.
    pub async fn run<P>(
        self,
        cancel: &CancellationToken,
        processor: P,
    ) -> Result<FlushReport, FlushError>
    where
        P: Processor<T>,
    {
        self.config.validate()?;
        let policy = policy::build(&self.config, Instant::now());
        self.run_with_policy(cancel, processor, policy).await
    }

    async fn run_with_policy<P>(
        self,
        cancel: &CancellationToken,
        processor: P,
        policy: Box<dyn FlushPolicy>,
    ) -> Result<FlushReport, FlushError>
    where
        P: Processor<T>,
    {
        let Scheduler { config, mut queue } = self;
        let max_batch_size = config.max_batch_size();
        let mut policy = PolicyGuard(policy);
        let mut batch = Accumulator::new(max_batch_size);
        let mut report = FlushReport::default();
        let mut state = SchedulerState::Accumulating;

        debug!(
            policy = %policy.kind(),
            max_batch_size,
            "scheduler started"
        );

        let outcome = loop {
            let event = Self::next_event(&mut queue, cancel, &mut *policy, batch.len()).await;

            let step = match event {
                Event::Item(item) => {
                    let pending = batch.push(item);
                    if policy.on_item(Instant::now(), pending, max_batch_size).is_flush() {
                        Self::flush_in_place(
                            &mut state,
                            cancel,
                            &processor,
                            &mut batch,
                            &mut report,
                            FlushTrigger::Size,
                        )
                        .await
                    } else {
                        Ok(())
                    }
                }
                Event::Idle => {
                    let decision = policy.on_idle_wake(Instant::now(), batch.len());
                    if decision.is_flush() && !batch.is_empty() {
                        Self::flush_in_place(
                            &mut state,
                            cancel,
                            &processor,
                            &mut batch,
                            &mut report,
                            FlushTrigger::Idle,
                        )
                        .await
                    } else {
                        Ok(())
                    }
                }
                Event::Closed => {
                    transition(&mut state, SchedulerState::Draining);
                    break Self::flush(
                        cancel,
                        &processor,
                        &mut batch,
                        &mut report,
                        FlushTrigger::Drain,
                    )
                    .await;
                }
                Event::Cancelled => {
                    info!(pending = batch.len(), "scheduler cancelled, draining queue");
                    transition(&mut state, SchedulerState::Draining);
                    report.cancelled = true;
                    break Self::drain_and_process(
                        &mut queue,
                        cancel,
                        &processor,
                        &mut batch,
                        &mut *policy,
                        &mut report,
                        max_batch_size,
                    )
                    .await;
                }
            };

            if let Err(e) = step {
                break Err(e);
            }
        };

        transition(&mut state, SchedulerState::Terminated);
        drop(policy);

        match outcome {
            Ok(()) => {
                info!(
                    batches = report.batches,
                    items = report.items,
                    cancelled = report.cancelled,
                    "scheduler terminated"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    batches = report.batches,
                    "scheduler stopped on processor failure"
                );
                Err(e)
            }
        }
    }

    async fn next_event(
        queue: &mut ItemQueue<T>,
        cancel: &CancellationToken,
        policy: &mut dyn FlushPolicy,
        pending: usize,
    ) -> Event<T> {
        if cancel.is_cancelled() {
            return Event::Cancelled;
        }

        let now = Instant::now();
        match policy.next_wake(now, pending) {
            Wake::Now => match queue.try_receive() {
                TryReceive::Item(item) => Event::Item(item),
                TryReceive::Empty => Event::Idle,
                TryReceive::Closed => Event::Closed,
            },
            // a deadline that passed while we were busy wins over queued items
            Wake::At(deadline) if deadline <= now => Event::Idle,
            Wake::At(deadline) => {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => Event::Cancelled,
                    item = queue.receive() => Event::from(item),
                    _ = sleep_until(deadline) => Event::Idle,
                }
            }
            Wake::Never => {
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => Event::Cancelled,
                    item = queue.receive() => Event::from(item),
                }
            }
        }
    }

    /// Flushes from `Accumulating` and returns there once the processor is done.
    async fn flush_in_place<P>(
        state: &mut SchedulerState,
        cancel: &CancellationToken,
        process: &P,
        batch: &mut Accumulator<T>,
        report: &mut FlushReport,
        trigger: FlushTrigger,
    ) -> Result<(), FlushError>
    where
        P: Processor<T>,
    {
        transition(state, SchedulerState::Flushing);
        Self::flush(cancel, process, batch, report, trigger).await?;
        transition(state, SchedulerState::Accumulating);
        Ok(())
    }

    /// Closes the queue, then batches up whatever is still buffered.
    async fn drain_and_process<P>(
        queue: &mut ItemQueue<T>,
        cancel: &CancellationToken,
        process: &P,
        batch: &mut Accumulator<T>,
        policy: &mut dyn FlushPolicy,
        report: &mut FlushReport,
        max_batch_size: usize,
    ) -> Result<(), FlushError>
    where
        P: Processor<T>,
    {
        queue.close();
        while let Some(item) = queue.receive().await {
            let pending = batch.push(item);
            if policy.on_item(Instant::now(), pending, max_batch_size).is_flush() {
                Self::flush(cancel, process, batch, report, FlushTrigger::Size).await?;
            }
        }
        Self::flush(cancel, process, batch, report, FlushTrigger::Drain).await
    }

    async fn flush<P>(
        cancel: &CancellationToken,
        process: &P,
        batch: &mut Accumulator<T>,
        report: &mut FlushReport,
        trigger: FlushTrigger,
    ) -> Result<(), FlushError>
    where
        P: Processor<T>,
    {
        if batch.is_empty() {
            return Ok(());
        }

        let items = batch.take();
        let size = items.len();
        debug!(%trigger, size, "flushing batch");

        process.process(cancel, items).await?;
        report.record(trigger, size);
        Ok(())
    }
}

fn transition(state: &mut SchedulerState, next: SchedulerState) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid scheduler transition {state} -> {next}"
    );
    trace!(from = %state, to = %next, "scheduler state");
    *state = next;
}
