use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;

use crate::{
    chain::AccountName,
    error::Result,
    storage::models::{AccountRecord, OperationOutcome, Queue, QueueStats, ReclaimOperation},
};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        for queue in [Queue::Pending, Queue::Skipped] {
            self.conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} (
                        seq INTEGER PRIMARY KEY AUTOINCREMENT,
                        account_name TEXT NOT NULL UNIQUE
                    )",
                    queue.table()
                ),
                [],
            )?;
        }

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS reclaim_operations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_name TEXT NOT NULL,
                outcome TEXT NOT NULL,
                reason TEXT,
                bytes_sold INTEGER NOT NULL,
                proceeds INTEGER NOT NULL,
                fee INTEGER NOT NULL,
                recovered INTEGER NOT NULL,
                timestamp TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_operations_outcome ON reclaim_operations(outcome)",
            [],
        )?;

        Ok(())
    }

    /// Start an all-or-nothing unit of work; dropping it without `commit` rolls back
    pub fn transaction(&mut self) -> Result<QueueTx<'_>> {
        Ok(QueueTx {
            tx: self.conn.transaction()?,
        })
    }

    pub fn accounts(&self, queue: Queue) -> Result<Vec<AccountRecord>> {
        accounts(&self.conn, queue)
    }

    pub fn count(&self, queue: Queue) -> Result<usize> {
        count(&self.conn, queue)
    }

    pub fn contains(&self, queue: Queue, account: &AccountName) -> Result<bool> {
        contains(&self.conn, queue, account)
    }

    pub fn get_reclaim_history(&self, limit: Option<usize>) -> Result<Vec<ReclaimOperation>> {
        // LIMIT -1 means no limit in SQLite
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let mut stmt = self.conn.prepare(
            "SELECT id, account_name, outcome, reason, bytes_sold, proceeds, fee, recovered, timestamp
             FROM reclaim_operations
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let operations = stmt
            .query_map([limit], operation_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(operations)
    }

    pub fn get_stats(&self) -> Result<QueueStats> {
        let (reclaimed, bytes_sold, recovered): (i64, Option<i64>, Option<i64>) = self.conn.query_row(
            "SELECT COUNT(*), SUM(bytes_sold), SUM(recovered)
             FROM reclaim_operations WHERE outcome = 'reclaimed'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        let skipped: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM reclaim_operations WHERE outcome = 'skipped'",
            [],
            |row| row.get(0),
        )?;

        Ok(QueueStats {
            pending_accounts: self.count(Queue::Pending)?,
            skipped_accounts: self.count(Queue::Skipped)?,
            reclaimed_operations: reclaimed as usize,
            skipped_operations: skipped as usize,
            total_bytes_sold: bytes_sold.unwrap_or(0),
            total_recovered: recovered.unwrap_or(0),
        })
    }
}

/// Mutating view of both account sets inside one SQLite transaction
pub struct QueueTx<'a> {
    tx: Transaction<'a>,
}

impl<'a> QueueTx<'a> {
    /// Append `account` to `queue`. Returns false when it was already there.
    pub fn insert(&self, queue: Queue, account: &AccountName) -> Result<bool> {
        let changed = self.tx.execute(
            &format!("INSERT OR IGNORE INTO {} (account_name) VALUES (?1)", queue.table()),
            params![account],
        )?;
        Ok(changed > 0)
    }

    /// Returns false when `account` was not in `queue`
    pub fn remove(&self, queue: Queue, account: &AccountName) -> Result<bool> {
        let changed = self.tx.execute(
            &format!("DELETE FROM {} WHERE account_name = ?1", queue.table()),
            params![account],
        )?;
        Ok(changed > 0)
    }

    /// Oldest entry of `queue`
    pub fn front(&self, queue: Queue) -> Result<Option<AccountName>> {
        let front = self
            .tx
            .query_row(
                &format!(
                    "SELECT account_name FROM {} ORDER BY seq ASC LIMIT 1",
                    queue.table()
                ),
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(front)
    }

    pub fn count(&self, queue: Queue) -> Result<usize> {
        count(&self.tx, queue)
    }

    #[cfg(test)]
    pub fn contains(&self, queue: Queue, account: &AccountName) -> Result<bool> {
        contains(&self.tx, queue, account)
    }

    #[cfg(test)]
    pub fn accounts(&self, queue: Queue) -> Result<Vec<AccountRecord>> {
        accounts(&self.tx, queue)
    }

    pub fn save_reclaim_operation(&self, operation: &ReclaimOperation) -> Result<()> {
        self.tx.execute(
            "INSERT INTO reclaim_operations
             (account_name, outcome, reason, bytes_sold, proceeds, fee, recovered, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                operation.account_name,
                operation.outcome.to_string(),
                operation.reason,
                operation.bytes_sold,
                operation.proceeds,
                operation.fee,
                operation.recovered,
                operation.timestamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

fn accounts(conn: &Connection, queue: Queue) -> Result<Vec<AccountRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT seq, account_name FROM {} ORDER BY seq ASC",
        queue.table()
    ))?;

    let records = stmt
        .query_map([], |row| {
            Ok(AccountRecord {
                seq: row.get(0)?,
                account_name: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(records)
}

fn count(conn: &Connection, queue: Queue) -> Result<usize> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", queue.table()),
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

fn contains(conn: &Connection, queue: Queue, account: &AccountName) -> Result<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE account_name = ?1", queue.table()),
            params![account],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn operation_from_row(row: &Row<'_>) -> rusqlite::Result<ReclaimOperation> {
    let outcome: String = row.get(2)?;
    let timestamp: String = row.get(8)?;

    Ok(ReclaimOperation {
        id: row.get(0)?,
        account_name: row.get(1)?,
        outcome: outcome
            .parse::<OperationOutcome>()
            .map_err(|e| conversion_error(2, e.into()))?,
        reason: row.get(3)?,
        bytes_sold: row.get(4)?,
        proceeds: row.get(5)?,
        fee: row.get(6)?,
        recovered: row.get(7)?,
        timestamp: timestamp
            .parse::<DateTime<Utc>>()
            .map_err(|e| conversion_error(8, Box::new(e)))?,
    })
}

fn conversion_error(
    column: usize,
    err: Box<dyn std::error::Error + Send + Sync>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    fn names(records: &[AccountRecord]) -> Vec<&str> {
        records.iter().map(|r| r.account_name.as_str()).collect()
    }

    #[test]
    fn test_insert_keeps_insertion_order_and_uniqueness() {
        let mut db = Database::open_in_memory().unwrap();
        let tx = db.transaction().unwrap();
        assert!(tx.insert(Queue::Pending, &name("carol")).unwrap());
        assert!(tx.insert(Queue::Pending, &name("alice")).unwrap());
        assert!(tx.insert(Queue::Pending, &name("bob")).unwrap());
        assert!(!tx.insert(Queue::Pending, &name("alice")).unwrap());
        assert_eq!(tx.front(Queue::Pending).unwrap(), Some(name("carol")));
        tx.commit().unwrap();

        let pending = db.accounts(Queue::Pending).unwrap();
        assert_eq!(names(&pending), vec!["carol", "alice", "bob"]);
        assert_eq!(db.count(Queue::Skipped).unwrap(), 0);
    }

    #[test]
    fn test_remove_and_front_advance() {
        let mut db = Database::open_in_memory().unwrap();
        let tx = db.transaction().unwrap();
        tx.insert(Queue::Skipped, &name("alice")).unwrap();
        tx.insert(Queue::Skipped, &name("bob")).unwrap();

        assert!(tx.remove(Queue::Skipped, &name("alice")).unwrap());
        assert!(!tx.remove(Queue::Skipped, &name("alice")).unwrap());
        assert_eq!(tx.front(Queue::Skipped).unwrap(), Some(name("bob")));

        tx.remove(Queue::Skipped, &name("bob")).unwrap();
        assert_eq!(tx.front(Queue::Skipped).unwrap(), None);
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let mut db = Database::open_in_memory().unwrap();
        {
            let tx = db.transaction().unwrap();
            tx.insert(Queue::Pending, &name("alice")).unwrap();
            tx.save_reclaim_operation(&ReclaimOperation::reclaimed(name("alice"), 10, 20, 1))
                .unwrap();
        }

        assert_eq!(db.count(Queue::Pending).unwrap(), 0);
        assert!(db.get_reclaim_history(None).unwrap().is_empty());
    }

    #[test]
    fn test_history_and_stats() {
        let mut db = Database::open_in_memory().unwrap();
        let tx = db.transaction().unwrap();
        tx.insert(Queue::Pending, &name("dave")).unwrap();
        tx.insert(Queue::Skipped, &name("erin")).unwrap();
        tx.save_reclaim_operation(&ReclaimOperation::reclaimed(name("alice"), 10_000, 19_801, 100))
            .unwrap();
        tx.save_reclaim_operation(&ReclaimOperation::skipped(
            name("bob"),
            "Not enough RAM to sell".to_string(),
            0,
        ))
        .unwrap();
        tx.commit().unwrap();

        let history = db.get_reclaim_history(Some(1)).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].account_name, name("bob"));
        assert_eq!(history[0].outcome, OperationOutcome::Skipped);
        assert_eq!(history[0].reason.as_deref(), Some("Not enough RAM to sell"));

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.pending_accounts, 1);
        assert_eq!(stats.skipped_accounts, 1);
        assert_eq!(stats.reclaimed_operations, 1);
        assert_eq!(stats.skipped_operations, 1);
        assert_eq!(stats.total_bytes_sold, 10_000);
        assert_eq!(stats.total_recovered, 19_701);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reclaim.db");

        {
            let mut db = Database::new(&path).unwrap();
            let tx = db.transaction().unwrap();
            tx.insert(Queue::Pending, &name("alice")).unwrap();
            tx.commit().unwrap();
        }

        let db = Database::new(&path).unwrap();
        assert!(db.contains(Queue::Pending, &name("alice")).unwrap());
        assert!(!db.contains(Queue::Skipped, &name("alice")).unwrap());
    }
}
