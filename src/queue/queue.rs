// src/queue/queue.rs

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendError, TryRecvError};

enum Sender<T> {
    Bounded(mpsc::Sender<T>),
    Unbounded(mpsc::UnboundedSender<T>),
}

enum Receiver<T> {
    Bounded(mpsc::Receiver<T>),
    Unbounded(mpsc::UnboundedReceiver<T>),
}

/// Creates a single-producer queue feeding one scheduler.
///
/// `None` gives an unbounded buffer. `Some(n)` bounds it to `n` items and
/// makes [`Producer::emit`] wait for room.
///
/// # Panics
///
/// Panics if `capacity` is `Some(0)`.
pub fn channel<T>(capacity: Option<usize>) -> (Producer<T>, ItemQueue<T>) {
    match capacity {
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity);
            (
                Producer {
                    sender: Sender::Bounded(tx),
                },
                ItemQueue {
                    receiver: Receiver::Bounded(rx),
                },
            )
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Producer {
                    sender: Sender::Unbounded(tx),
                },
                ItemQueue {
                    receiver: Receiver::Unbounded(rx),
                },
            )
        }
    }
}

/// Sending half of the item queue.
///
/// There is exactly one producer per queue. [`finish`](Producer::finish)
/// consumes it, so nothing can be emitted after the queue is closed.
pub struct Producer<T> {
    sender: Sender<T>,
}

impl<T> Producer<T> {
    /// Appends an item to the queue.
    ///
    /// Fails with the item handed back when the scheduler is gone or has
    /// closed the queue after a cancellation.
    pub async fn emit(&self, item: T) -> Result<(), SendError<T>> {
        match &self.sender {
            Sender::Bounded(tx) => tx.send(item).await,
            Sender::Unbounded(tx) => tx.send(item),
        }
    }

    /// Signals that no more items follow.
    pub fn finish(self) {
        tracing::trace!("producer finished");
    }

    /// Returns true once the consuming side has stopped accepting items.
    pub fn is_closed(&self) -> bool {
        match &self.sender {
            Sender::Bounded(tx) => tx.is_closed(),
            Sender::Unbounded(tx) => tx.is_closed(),
        }
    }
}

/// Outcome of a non-blocking receive.
#[derive(Debug, PartialEq, Eq)]
pub enum TryReceive<T> {
    Item(T),
    /// Open, nothing buffered right now.
    Empty,
    /// Closed and fully drained.
    Closed,
}

/// Receiving half of the item queue, owned by the scheduler loop.
pub struct ItemQueue<T> {
    receiver: Receiver<T>,
}

impl<T> ItemQueue<T> {
    /// Waits for the next item.
    ///
    /// Returns `None` only when the queue is closed and empty. Cancel safe, so
    /// it can be raced against a deadline in `tokio::select!`.
    pub async fn receive(&mut self) -> Option<T> {
        match &mut self.receiver {
            Receiver::Bounded(rx) => rx.recv().await,
            Receiver::Unbounded(rx) => rx.recv().await,
        }
    }

    pub fn try_receive(&mut self) -> TryReceive<T> {
        let result = match &mut self.receiver {
            Receiver::Bounded(rx) => rx.try_recv(),
            Receiver::Unbounded(rx) => rx.try_recv(),
        };
        match result {
            Ok(item) => TryReceive::Item(item),
            Err(TryRecvError::Empty) => TryReceive::Empty,
            Err(TryRecvError::Disconnected) => TryReceive::Closed,
        }
    }

    /// Stops accepting new items. Items already buffered stay receivable.
    pub fn close(&mut self) {
        match &mut self.receiver {
            Receiver::Bounded(rx) => rx.close(),
            Receiver::Unbounded(rx) => rx.close(),
        }
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        match &self.receiver {
            Receiver::Bounded(rx) => rx.len(),
            Receiver::Unbounded(rx) => rx.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
