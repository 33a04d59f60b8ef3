use thiserror::Error;

use crate::chain::AccountName;

#[derive(Error, Debug)]
pub enum ReclaimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("missing authority of {0}")]
    MissingAuthority(AccountName),

    #[error("Invalid account name: {0}")]
    InvalidName(String),

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("User has no resource entry: {0}")]
    NoResourceEntry(AccountName),

    #[error("No RAM Market? ({0})")]
    NoRamMarket(String),

    #[error("Invalid market reserves: {0}")]
    InvalidMarket(String),

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("No accounts to sell RAM from")]
    NothingToSell,

    #[error("Accounts list must be empty first")]
    PendingNotEmpty,

    #[error("No accounts copy from skipped accounts list")]
    NothingToRetry,

    #[error("Action rejected by ledger: {0}")]
    ActionRejected(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReclaimError>;
