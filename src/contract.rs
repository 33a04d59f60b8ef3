//! The RAM reclaim contract: two persisted account sets plus the four
//! owner-only operations that move accounts between them.
//!
//! Every operation runs as one unit of work. Set mutations happen inside a
//! SQLite transaction and the host actions they produce are buffered; the
//! actions are dispatched only once the operation succeeded, and the
//! transaction commits only once the ledger accepted them. Any error leaves
//! both the sets and the ledger as they were.

use tracing::{error, info};

use crate::{
    auth::{Authority, OwnerAuth},
    chain::{AccountName, Ledger, RamQuote},
    config::ReclaimSettings,
    error::{ReclaimError, Result},
    reclaim::{BatchSummary, QueueManager, ReclaimEngine, RetryDispatcher},
    storage::{Database, Queue},
};

pub struct RamReclaimContract<L: Ledger> {
    db: Database,
    ledger: L,
    settings: ReclaimSettings,
    authority: Authority,
}

impl<L: Ledger> RamReclaimContract<L> {
    pub fn new(db: Database, ledger: L, settings: ReclaimSettings) -> Self {
        let authority = Authority::new(settings.contract.clone());
        Self {
            db,
            ledger,
            settings,
            authority,
        }
    }

    /// Boundary check: only the contract account may drive the contract
    pub fn require_auth(&self, actor: &AccountName) -> Result<OwnerAuth> {
        self.authority.require_auth(actor)
    }

    pub fn settings(&self) -> &ReclaimSettings {
        &self.settings
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn pending_count(&self) -> Result<usize> {
        self.db.count(Queue::Pending)
    }

    pub fn add(&mut self, auth: &OwnerAuth, accounts: &[AccountName]) -> Result<usize> {
        self.check_owner(auth)?;

        let tx = self.db.transaction()?;
        let added = QueueManager::new(&tx).add(accounts)?;
        tx.commit()?;

        Ok(added)
    }

    pub fn remove(&mut self, auth: &OwnerAuth, accounts: &[AccountName]) -> Result<usize> {
        self.check_owner(auth)?;

        let tx = self.db.transaction()?;
        let removed = QueueManager::new(&tx).remove(accounts)?;
        tx.commit()?;

        Ok(removed)
    }

    /// Reclaim RAM from up to `n` pending accounts
    pub fn sellram(&mut self, auth: &OwnerAuth, n: u8) -> Result<BatchSummary> {
        self.check_owner(auth)?;

        let tx = self.db.transaction()?;
        let batch = ReclaimEngine::new(&self.settings).sell_batch(&tx, &self.ledger, n)?;

        self.ledger.dispatch(&batch.actions)?;
        if let Err(e) = tx.commit() {
            error!(
                "Ledger accepted {} actions but the queue update failed: {}",
                batch.actions.len(),
                e
            );
            return Err(e);
        }

        info!(
            "sellram({}): {} processed, {} reclaimed, {} skipped, {} actions dispatched",
            n,
            batch.summary.processed,
            batch.summary.reclaimed,
            batch.summary.skipped,
            batch.actions.len()
        );
        Ok(batch.summary)
    }

    /// Move up to `n` skipped accounts back to pending; pending must be empty
    pub fn retry(&mut self, auth: &OwnerAuth, n: u8) -> Result<Vec<AccountName>> {
        self.check_owner(auth)?;

        let tx = self.db.transaction()?;
        let moved = RetryDispatcher::new(&tx).retry(n)?;
        tx.commit()?;

        info!("retry({}): {} accounts requeued", n, moved.len());
        Ok(moved)
    }

    /// What a `sellram` would currently yield for `account`, without side effects
    pub fn quote(&self, account: &AccountName) -> Result<RamQuote> {
        let entry = self
            .ledger
            .resource_entry(account)?
            .ok_or_else(|| ReclaimError::NoResourceEntry(account.clone()))?;
        let market = self
            .ledger
            .market(&self.settings.market_symbol)?
            .ok_or_else(|| ReclaimError::NoRamMarket(self.settings.market_symbol.to_string()))?;

        self.settings.calculator.quote(entry.ram_bytes, &market)
    }

    fn check_owner(&self, auth: &OwnerAuth) -> Result<()> {
        if auth.account() != &self.settings.contract {
            return Err(ReclaimError::MissingAuthority(self.settings.contract.clone()));
        }
        Ok(())
    }
}
