use tracing::debug;

use crate::{
    chain::AccountName,
    error::{ReclaimError, Result},
    storage::{Queue, QueueTx},
};

/// Feeds skipped accounts back into the pending set
pub struct RetryDispatcher<'t, 'c> {
    tx: &'t QueueTx<'c>,
}

impl<'t, 'c> RetryDispatcher<'t, 'c> {
    pub fn new(tx: &'t QueueTx<'c>) -> Self {
        Self { tx }
    }

    /// Move up to `n` accounts from the front of the skipped set to pending.
    ///
    /// Refuses to run while anything is still pending.
    pub fn retry(&self, n: u8) -> Result<Vec<AccountName>> {
        if self.tx.front(Queue::Pending)?.is_some() {
            return Err(ReclaimError::PendingNotEmpty);
        }

        let mut moved = Vec::new();
        while moved.len() < n as usize {
            let Some(account) = self.tx.front(Queue::Skipped)? else {
                break;
            };

            self.tx.insert(Queue::Pending, &account)?;
            self.tx.remove(Queue::Skipped, &account)?;
            debug!("Requeued skipped account: {}", account);
            moved.push(account);
        }

        if moved.is_empty() {
            return Err(ReclaimError::NothingToRetry);
        }

        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    fn seed(db: &mut Database, pending: &[&str], skipped: &[&str]) {
        let tx = db.transaction().unwrap();
        for a in pending {
            tx.insert(Queue::Pending, &a.parse().unwrap()).unwrap();
        }
        for a in skipped {
            tx.insert(Queue::Skipped, &a.parse().unwrap()).unwrap();
        }
        tx.commit().unwrap();
    }

    fn listed(db: &Database, queue: Queue) -> Vec<String> {
        db.accounts(queue)
            .unwrap()
            .into_iter()
            .map(|r| r.account_name.to_string())
            .collect()
    }

    #[test]
    fn test_moves_front_of_skipped_in_order() {
        let mut db = Database::open_in_memory().unwrap();
        seed(&mut db, &[], &["carol", "alice", "bob"]);

        let tx = db.transaction().unwrap();
        let moved = RetryDispatcher::new(&tx).retry(2).unwrap();
        tx.commit().unwrap();

        assert_eq!(moved.len(), 2);
        assert_eq!(listed(&db, Queue::Pending), vec!["carol", "alice"]);
        assert_eq!(listed(&db, Queue::Skipped), vec!["bob"]);
    }

    #[test]
    fn test_moves_at_most_what_is_skipped() {
        let mut db = Database::open_in_memory().unwrap();
        seed(&mut db, &[], &["alice"]);

        let tx = db.transaction().unwrap();
        let moved = RetryDispatcher::new(&tx).retry(255).unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(tx.count(Queue::Skipped).unwrap(), 0);
    }

    #[test]
    fn test_refuses_while_pending() {
        let mut db = Database::open_in_memory().unwrap();
        seed(&mut db, &["dave"], &["alice"]);

        let tx = db.transaction().unwrap();
        let err = RetryDispatcher::new(&tx).retry(5).unwrap_err();
        assert!(matches!(err, ReclaimError::PendingNotEmpty));
        assert_eq!(err.to_string(), "Accounts list must be empty first");
    }

    #[test]
    fn test_zero_moved_is_an_error() {
        let mut db = Database::open_in_memory().unwrap();

        let tx = db.transaction().unwrap();
        assert!(matches!(
            RetryDispatcher::new(&tx).retry(5),
            Err(ReclaimError::NothingToRetry)
        ));
        drop(tx);

        seed(&mut db, &[], &["alice"]);
        let tx = db.transaction().unwrap();
        assert!(matches!(
            RetryDispatcher::new(&tx).retry(0),
            Err(ReclaimError::NothingToRetry)
        ));
    }
}
