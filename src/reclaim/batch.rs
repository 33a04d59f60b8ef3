use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::{
    auth::OwnerAuth,
    chain::{AccountName, Asset, Ledger, Symbol},
    contract::RamReclaimContract,
    error::{ReclaimError, Result},
    reclaim::engine::AccountOutcome,
};

/// Drains the pending set in bounded `sellram` batches with a pause between them
pub struct BatchProcessor {
    batch_size: u8,
    batch_delay: Duration,
}

impl BatchProcessor {
    pub fn new(batch_size: u8, batch_delay_ms: u64) -> Result<Self> {
        if batch_size == 0 {
            return Err(ReclaimError::Config("batch_size must be at least 1".to_string()));
        }
        Ok(Self {
            batch_size,
            batch_delay: Duration::from_millis(batch_delay_ms),
        })
    }

    /// Run `sellram` until nothing is pending. A fatal batch error stops the
    /// run; batches committed before it stay committed.
    pub async fn drain<L: Ledger>(
        &self,
        contract: &mut RamReclaimContract<L>,
        auth: &OwnerAuth,
    ) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        let pending = contract.pending_count()?;

        if pending == 0 {
            info!("No pending accounts to reclaim");
            return Ok(summary);
        }

        let total_batches = pending.div_ceil(self.batch_size as usize);
        info!(
            "Processing {} pending accounts in batches of {}",
            pending, self.batch_size
        );

        let mut batch_num = 0;
        loop {
            batch_num += 1;
            info!("Processing batch {}/{}", batch_num, total_batches);

            match contract.sellram(auth, self.batch_size) {
                Ok(batch) => summary.merge(batch),
                Err(e) => {
                    warn!("Batch {} aborted: {}", batch_num, e);
                    return Err(e);
                }
            }

            if contract.pending_count()? == 0 {
                break;
            }
            tokio::time::sleep(self.batch_delay).await;
        }

        info!(
            "Batch processing complete: {} reclaimed, {} skipped, {} recovered",
            summary.reclaimed,
            summary.skipped,
            Asset::new(summary.total_recovered, contract.settings().core_symbol.clone())
        );

        Ok(summary)
    }
}

/// Summary of one or more `sellram` batches
#[derive(Debug, Default, Clone, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub reclaimed: usize,
    pub skipped: usize,
    pub total_bytes_sold: i64,
    pub total_recovered: i64,
    pub results: Vec<(AccountName, AccountOutcome)>,
}

impl BatchSummary {
    pub fn record(&mut self, account: AccountName, outcome: AccountOutcome) {
        self.processed += 1;
        match &outcome {
            AccountOutcome::Reclaimed { bytes_sold, recovered, .. } => {
                self.reclaimed += 1;
                self.total_bytes_sold += bytes_sold;
                self.total_recovered += recovered;
            }
            AccountOutcome::Skipped(_) => self.skipped += 1,
        }
        self.results.push((account, outcome));
    }

    pub fn merge(&mut self, other: BatchSummary) {
        self.processed += other.processed;
        self.reclaimed += other.reclaimed;
        self.skipped += other.skipped;
        self.total_bytes_sold += other.total_bytes_sold;
        self.total_recovered += other.total_recovered;
        self.results.extend(other.results);
    }

    /// Print a formatted summary to console
    pub fn print_summary(&self, core_symbol: &Symbol) {
        println!("\n=== RAM Reclaim Batch Summary ===");
        println!("Processed:       {}", self.processed);
        println!("Reclaimed:       {} ✓", self.reclaimed);
        println!("Skipped:         {} ✗", self.skipped);
        println!("Success Rate:    {:.1}%", self.success_rate());
        println!("Bytes Sold:      {}", self.total_bytes_sold);
        println!(
            "Total Recovered: {}",
            Asset::new(self.total_recovered, core_symbol.clone())
        );
        println!("=================================");
    }

    /// Get success rate as percentage
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            (self.reclaimed as f64 / self.processed as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{LedgerState, MarketState, RamCalculator, SnapshotLedger};
    use crate::config::Config;
    use crate::reclaim::engine::SkipReason;
    use crate::storage::{Database, Queue};

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    fn contract(ram: &[(&str, i64)]) -> RamReclaimContract<SnapshotLedger> {
        let settings = Config::default().settings().unwrap();
        let mut state = LedgerState::default();
        for (account, bytes) in ram {
            state.resources.insert(name(account), *bytes);
        }
        state.markets.insert(
            "RAMCORE".to_string(),
            MarketState {
                supply: Asset::new(100_000_000_000_000, Symbol::new("RAMCORE", 4).unwrap()),
                base: Asset::new(1_000_000, Symbol::new("RAM", 0).unwrap()),
                quote: Asset::new(2_000_000, Symbol::new("TLOS", 4).unwrap()),
            },
        );
        let ledger = SnapshotLedger::new(state, RamCalculator::default(), settings.market_symbol.clone());
        RamReclaimContract::new(Database::open_in_memory().unwrap(), ledger, settings)
    }

    #[test]
    fn test_summary_bookkeeping() {
        let mut summary = BatchSummary::default();
        summary.record(
            name("alice"),
            AccountOutcome::Reclaimed {
                bytes_sold: 10_000,
                proceeds: 19_801,
                fee: 100,
                recovered: 19_701,
            },
        );
        summary.record(
            name("bob"),
            AccountOutcome::Skipped(SkipReason::NotEnoughRam { owned_bytes: 3000 }),
        );

        let mut total = BatchSummary::default();
        total.merge(summary);
        assert_eq!(total.processed, 2);
        assert_eq!(total.reclaimed, 1);
        assert_eq!(total.skipped, 1);
        assert_eq!(total.total_recovered, 19_701);
        assert_eq!(total.success_rate(), 50.0);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(BatchProcessor::new(0, 0).is_err());
    }

    #[tokio::test]
    async fn test_drain_runs_until_pending_is_empty() {
        let mut contract = contract(&[
            ("alice", 13_010),
            ("bob", 100),
            ("carol", 13_010),
            ("dave", 13_010),
            ("erin", 500),
        ]);
        let auth = contract.require_auth(&name("ramreclaimer")).unwrap();
        let accounts: Vec<_> = ["alice", "bob", "carol", "dave", "erin"]
            .iter()
            .map(|s| name(s))
            .collect();
        contract.add(&auth, &accounts).unwrap();

        let summary = BatchProcessor::new(2, 0)
            .unwrap()
            .drain(&mut contract, &auth)
            .await
            .unwrap();

        assert_eq!(summary.processed, 5);
        assert_eq!(summary.reclaimed, 3);
        assert_eq!(summary.skipped, 2);
        assert_eq!(contract.pending_count().unwrap(), 0);
        assert_eq!(contract.database().count(Queue::Skipped).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_drain_with_nothing_pending_is_a_noop() {
        let mut contract = contract(&[]);
        let auth = contract.require_auth(&name("ramreclaimer")).unwrap();

        let summary = BatchProcessor::new(5, 0)
            .unwrap()
            .drain(&mut contract, &auth)
            .await
            .unwrap();
        assert_eq!(summary.processed, 0);
    }
}
