//! Simple scheduler example showing size and idle flushes.
//!
//! Run with: cargo run --example simple_scheduler

use async_trait::async_trait;
use batch_flush::policy::FlushPolicyKind;
use batch_flush::scheduler::{ConfigBuilder, FlushError, Processor, Scheduler};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Simple processor that prints batch information
struct PrintingProcessor;

#[async_trait]
impl Processor<i32> for PrintingProcessor {
    async fn process(&self, _ctx: &CancellationToken, batch: Vec<i32>) -> Result<(), FlushError> {
        println!("Processing batch of {} items: {:?}", batch.len(), batch);
        // Simulate some work
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = Arc::new(
        ConfigBuilder::default()
            .max_batch_size(10usize)
            .flush_policy(FlushPolicyKind::DebouncedWait)
            .idle_timeout(Duration::from_millis(100))
            .build()?,
    );

    let (producer, scheduler) = Scheduler::with_producer(config);
    let cancel = CancellationToken::new();

    println!("Starting scheduler...");
    println!("- Max batch size: 10");
    println!("- Idle timeout: 100ms");
    println!("- Processing 25 items in three bursts\n");

    let emitter = tokio::spawn(async move {
        for burst in [12, 7, 6] {
            for _ in 0..burst {
                if let Err(e) = producer.emit(burst).await {
                    eprintln!("Failed to emit item: {}", e);
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
        producer.finish();
    });

    let (emit_result, run_result) =
        tokio::join!(emitter, scheduler.run(&cancel, PrintingProcessor));

    emit_result?;
    let report = run_result?;

    println!("\nScheduler completed: {:?}", report);
    Ok(())
}
