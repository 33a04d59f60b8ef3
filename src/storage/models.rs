use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chain::AccountName;

/// The two account sets the contract maintains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Queue {
    /// Accounts awaiting RAM reclamation
    Pending,
    /// Accounts whose last reclamation attempt was skipped
    Skipped,
}

impl Queue {
    pub fn table(&self) -> &'static str {
        match self {
            Queue::Pending => "pending_accounts",
            Queue::Skipped => "skipped_accounts",
        }
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Queue::Pending => write!(f, "pending"),
            Queue::Skipped => write!(f, "skipped"),
        }
    }
}

impl FromStr for Queue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" | "accounts" => Ok(Queue::Pending),
            "skipped" => Ok(Queue::Skipped),
            other => Err(format!("unknown queue '{}'", other)),
        }
    }
}

/// One row of either account set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Insertion sequence; iteration follows it
    pub seq: i64,
    pub account_name: AccountName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationOutcome {
    Reclaimed,
    Skipped,
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationOutcome::Reclaimed => write!(f, "reclaimed"),
            OperationOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

impl FromStr for OperationOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reclaimed" => Ok(OperationOutcome::Reclaimed),
            "skipped" => Ok(OperationOutcome::Skipped),
            other => Err(format!("unknown outcome '{}'", other)),
        }
    }
}

/// Journal entry for one account handled by a `sellram` batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReclaimOperation {
    pub id: i64,
    pub account_name: AccountName,
    pub outcome: OperationOutcome,
    pub reason: Option<String>,
    pub bytes_sold: i64,
    pub proceeds: i64,
    pub fee: i64,
    pub recovered: i64,
    pub timestamp: DateTime<Utc>,
}

impl ReclaimOperation {
    pub fn reclaimed(account_name: AccountName, bytes_sold: i64, proceeds: i64, fee: i64) -> Self {
        Self {
            id: 0,
            account_name,
            outcome: OperationOutcome::Reclaimed,
            reason: None,
            bytes_sold,
            proceeds,
            fee,
            recovered: proceeds - fee,
            timestamp: Utc::now(),
        }
    }

    /// `bytes_sold` is non-zero when the sale went out before the skip
    pub fn skipped(account_name: AccountName, reason: String, bytes_sold: i64) -> Self {
        Self {
            id: 0,
            account_name,
            outcome: OperationOutcome::Skipped,
            reason: Some(reason),
            bytes_sold,
            proceeds: 0,
            fee: 0,
            recovered: 0,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct QueueStats {
    pub pending_accounts: usize,
    pub skipped_accounts: usize,
    pub reclaimed_operations: usize,
    pub skipped_operations: usize,
    pub total_bytes_sold: i64,
    pub total_recovered: i64,
}
