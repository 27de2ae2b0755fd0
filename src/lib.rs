//! # batch-flush
//!
//! A bounded-latency batching scheduler built on Tokio.
//!
//! Items emitted by a single producer are grouped into batches and handed to
//! a processor, either when a batch reaches its size threshold or when the
//! configured flush policy decides a partial batch has waited long enough.
//!
//! ## Features
//!
//! - **Three flush policies**: greedy drain, debounced wait and fixed tick
//! - **At-most-once delivery** with producer order preserved across batches
//! - **Drain on close** and on cancellation, never an empty batch
//! - **Single batch in flight**, so memory stays bounded by the batch size
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use batch_flush::policy::FlushPolicyKind;
//! use batch_flush::scheduler::{ConfigBuilder, Scheduler};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = Arc::new(
//!     ConfigBuilder::default()
//!         .max_batch_size(500usize)
//!         .flush_policy(FlushPolicyKind::DebouncedWait)
//!         .idle_timeout(Duration::from_millis(40))
//!         .build()?,
//! );
//!
//! let (producer, scheduler) = Scheduler::<u64>::with_producer(config);
//! // emit from one task, `scheduler.run(&cancel, processor)` in another
//! ```
//!
//! ## Modules
//!
//! - [`queue`] - Single-producer item queue feeding the scheduler
//! - [`policy`] - Flush policies deciding when a partial batch goes out
//! - [`scheduler`] - Configuration, processor seam and the scheduler loop

pub mod policy;
pub mod queue;
pub mod scheduler;
