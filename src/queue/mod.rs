pub mod queue;

pub use queue::{ItemQueue, Producer, TryReceive, channel};
pub use tokio::sync::mpsc::error::SendError;
