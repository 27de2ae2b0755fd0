//! Runs the same bursty workload through all three flush policies.
//!
//! The processor has a fixed cost per call, so fewer, larger batches finish
//! sooner while idle flushes keep latency bounded.
//!
//! Run with: cargo run --example policy_comparison

use batch_flush::policy::FlushPolicyKind;
use batch_flush::scheduler::{ConfigBuilder, FlushError, FlushReport, Scheduler};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

const ITEMS: u64 = 2000;

async fn run_policy(
    policy: FlushPolicyKind,
) -> Result<(FlushReport, Duration), Box<dyn std::error::Error>> {
    let config = Arc::new(
        ConfigBuilder::default()
            .max_batch_size(250usize)
            .flush_policy(policy)
            .idle_timeout(Duration::from_millis(5))
            .tick_period(Duration::from_millis(5))
            .build()?,
    );
    let (producer, scheduler) = Scheduler::with_producer(config);

    let emitter = tokio::spawn(async move {
        let mut rng = StdRng::seed_from_u64(1);
        let mut next = 0;
        while next < ITEMS {
            let burst = rng.random_range(1..=150).min(ITEMS - next);
            for _ in 0..burst {
                producer.emit(next).await?;
                next += 1;
            }
            tokio::time::sleep(Duration::from_millis(rng.random_range(0..=8))).await;
        }
        producer.finish();
        Ok::<(), tokio::sync::mpsc::error::SendError<u64>>(())
    });

    // injected sink instead of shared global state
    let delivered = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&delivered);
    let processor = move |_ctx: &CancellationToken, batch: Vec<u64>| {
        let sink = Arc::clone(&sink);
        async move {
            tokio::time::sleep(Duration::from_millis(2)).await;
            sink.fetch_add(batch.len(), Ordering::SeqCst);
            Ok::<(), FlushError>(())
        }
    };

    let started = Instant::now();
    let report = scheduler.run(&CancellationToken::new(), processor).await?;
    let elapsed = started.elapsed();
    emitter.await??;

    assert_eq!(delivered.load(Ordering::SeqCst) as u64, ITEMS);
    Ok((report, elapsed))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!(
        "{:<16} {:>8} {:>6} {:>6} {:>6} {:>10}",
        "policy", "batches", "size", "idle", "drain", "elapsed"
    );
    for policy in [
        FlushPolicyKind::GreedyDrain,
        FlushPolicyKind::DebouncedWait,
        FlushPolicyKind::FixedTick,
    ] {
        let (report, elapsed) = run_policy(policy).await?;
        println!(
            "{:<16} {:>8} {:>6} {:>6} {:>6} {:>10.1?}",
            policy.as_str(),
            report.batches,
            report.size_flushes,
            report.idle_flushes,
            report.drain_flushes,
            elapsed
        );
    }
    Ok(())
}
