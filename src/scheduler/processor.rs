// src/scheduler/processor.rs

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::types::FlushError;

/// Receives finalized batches from the scheduler loop.
///
/// Each batch is handed over by value exactly once. The loop waits for the
/// call to return before it accumulates the next batch.
#[async_trait]
pub trait Processor<T>: Send + Sync {
    async fn process(&self, cancel: &CancellationToken, batch: Vec<T>) -> Result<(), FlushError>;
}

#[async_trait]
impl<T, F, Fut> Processor<T> for F
where
    F: Fn(&CancellationToken, Vec<T>) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<(), FlushError>> + Send,
    T: Send + 'static,
{
    async fn process(&self, ctx: &CancellationToken, batch: Vec<T>) -> Result<(), FlushError> {
        self(ctx, batch).await
    }
}
