use tracing::{info, warn};

use crate::{
    chain::AccountName,
    error::Result,
    storage::{Queue, QueueTx},
};

/// Adds and removes accounts from the pending and skipped sets
pub struct QueueManager<'t, 'c> {
    tx: &'t QueueTx<'c>,
}

impl<'t, 'c> QueueManager<'t, 'c> {
    pub fn new(tx: &'t QueueTx<'c>) -> Self {
        Self { tx }
    }

    /// Queue `accounts` for reclamation, returning how many were newly queued.
    ///
    /// An account already pending keeps its position. An account sitting in the
    /// skipped set is taken out of it so the two sets stay disjoint.
    pub fn add(&self, accounts: &[AccountName]) -> Result<usize> {
        let mut added = 0;

        for account in accounts {
            if self.tx.remove(Queue::Skipped, account)? {
                info!("Account {} moved out of skipped list", account);
            }

            if self.tx.insert(Queue::Pending, account)? {
                added += 1;
                info!("Added account: {}", account);
            } else {
                warn!("Account {} is already pending, ignoring", account);
            }
        }

        Ok(added)
    }

    /// Drop `accounts` from both sets; absent accounts are ignored
    pub fn remove(&self, accounts: &[AccountName]) -> Result<usize> {
        let mut removed = 0;

        for account in accounts {
            let from_pending = self.tx.remove(Queue::Pending, account)?;
            let from_skipped = self.tx.remove(Queue::Skipped, account)?;

            if from_pending || from_skipped {
                removed += 1;
            }
            info!("Removed account: {}", account);
        }

        Ok(removed)
    }
}
