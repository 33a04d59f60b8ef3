pub mod db;
pub mod models;

pub use db::{Database, QueueTx};
pub use models::{AccountRecord, OperationOutcome, Queue, QueueStats, ReclaimOperation};
