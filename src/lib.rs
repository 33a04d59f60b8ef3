pub mod auth;
pub mod chain;
pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod reclaim;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use contract::RamReclaimContract;
pub use error::{ReclaimError, Result};
