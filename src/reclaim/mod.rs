pub mod batch;
pub mod engine;
pub mod queue;
pub mod retry;

pub use batch::{BatchProcessor, BatchSummary};
pub use engine::{AccountOutcome, BatchOutcome, ReclaimEngine, SkipReason};
pub use queue::QueueManager;
pub use retry::RetryDispatcher;
