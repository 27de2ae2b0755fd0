pub mod accumulator;
pub mod config;
pub mod processor;
pub mod scheduler;
pub mod types;

pub use accumulator::Accumulator;
pub use config::{Config, ConfigBuilder, ConfigBuilderError};
pub use processor::Processor;
pub use scheduler::Scheduler;
pub use types::{FlushError, FlushReport, SchedulerState};
