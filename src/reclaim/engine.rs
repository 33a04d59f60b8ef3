use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::{
    chain::{AccountName, Asset, HostAction, Ledger, PermissionLevel, RamCalculator},
    config::ReclaimSettings,
    error::{ReclaimError, Result},
    reclaim::batch::BatchSummary,
    storage::{Queue, QueueTx, ReclaimOperation},
};

/// Why an account was moved to the skipped set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NotEnoughRam { owned_bytes: i64 },
    PriceTooLow { reclaimable_bytes: i64 },
    /// `sold_bytes` is non-zero when the sale was issued before the skip
    TransferTooSmall { proceeds: i64, fee: i64, sold_bytes: i64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotEnoughRam { .. } => write!(f, "Not enough RAM to sell"),
            SkipReason::PriceTooLow { .. } => write!(f, "RAM price too low"),
            SkipReason::TransferTooSmall { .. } => write!(f, "Transfer amount too small"),
        }
    }
}

/// What happened to one pending account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AccountOutcome {
    Reclaimed {
        bytes_sold: i64,
        proceeds: i64,
        fee: i64,
        recovered: i64,
    },
    Skipped(SkipReason),
}

/// Result of one `sellram` batch: what happened and what the host must execute
#[derive(Debug)]
pub struct BatchOutcome {
    pub summary: BatchSummary,
    pub actions: Vec<HostAction>,
}

/// Sells the spare RAM of pending accounts and forwards the proceeds
pub struct ReclaimEngine<'s> {
    settings: &'s ReclaimSettings,
}

impl<'s> ReclaimEngine<'s> {
    pub fn new(settings: &'s ReclaimSettings) -> Self {
        Self { settings }
    }

    /// Handle up to `n` accounts from the front of the pending set.
    ///
    /// Every handled account leaves the pending set: reclaimed accounts are
    /// dropped, unviable ones move to the skipped set. A missing resource entry
    /// or market aborts the whole batch.
    pub fn sell_batch<L: Ledger + ?Sized>(
        &self,
        tx: &QueueTx<'_>,
        ledger: &L,
        n: u8,
    ) -> Result<BatchOutcome> {
        let mut summary = BatchSummary::default();
        let mut actions = Vec::new();

        while summary.processed < n as usize {
            let Some(account) = tx.front(Queue::Pending)? else {
                break;
            };
            debug!("Selling RAM from: {}", account);

            let outcome = self.reclaim_account(ledger, &account, &mut actions)?;
            tx.remove(Queue::Pending, &account)?;

            match &outcome {
                AccountOutcome::Reclaimed { bytes_sold, proceeds, fee, recovered } => {
                    info!(
                        "Reclaimed {} bytes from {}: {} recovered",
                        bytes_sold,
                        account,
                        Asset::new(*recovered, self.settings.core_symbol.clone())
                    );
                    tx.save_reclaim_operation(&ReclaimOperation::reclaimed(
                        account.clone(),
                        *bytes_sold,
                        *proceeds,
                        *fee,
                    ))?;
                }
                AccountOutcome::Skipped(reason) => {
                    warn!("{} Skipping {}...", reason, account);
                    tx.insert(Queue::Skipped, &account)?;

                    let sold_bytes = match reason {
                        SkipReason::TransferTooSmall { sold_bytes, .. } => *sold_bytes,
                        _ => 0,
                    };
                    tx.save_reclaim_operation(&ReclaimOperation::skipped(
                        account.clone(),
                        reason.to_string(),
                        sold_bytes,
                    ))?;
                }
            }

            summary.record(account, outcome);
        }

        if summary.processed == 0 {
            return Err(ReclaimError::NothingToSell);
        }

        Ok(BatchOutcome { summary, actions })
    }

    /// Price one account and append the host actions it needs
    fn reclaim_account<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        account: &AccountName,
        actions: &mut Vec<HostAction>,
    ) -> Result<AccountOutcome> {
        let calculator = &self.settings.calculator;

        let entry = ledger
            .resource_entry(account)?
            .ok_or_else(|| ReclaimError::NoResourceEntry(account.clone()))?;

        let reclaimable = calculator.reclaimable_bytes(entry.ram_bytes);
        if reclaimable <= 0 {
            return Ok(AccountOutcome::Skipped(SkipReason::NotEnoughRam {
                owned_bytes: entry.ram_bytes,
            }));
        }

        let market = ledger
            .market(&self.settings.market_symbol)?
            .ok_or_else(|| ReclaimError::NoRamMarket(self.settings.market_symbol.to_string()))?;

        let proceeds =
            RamCalculator::bancor_output(market.base.amount, market.quote.amount, reclaimable)?;
        if proceeds <= 0 {
            return Ok(AccountOutcome::Skipped(SkipReason::PriceTooLow {
                reclaimable_bytes: reclaimable,
            }));
        }

        let fee = calculator.fee(proceeds);
        let recoverable = proceeds - fee;

        let authorization = PermissionLevel {
            actor: account.clone(),
            permission: self.settings.permission.clone(),
        };
        let sell = HostAction::SellRam {
            account: account.clone(),
            bytes: reclaimable,
            authorization: authorization.clone(),
        };

        // The sale goes out before the transfer amount is checked unless the
        // deployment asks to hold it back.
        let sale_first = !self.settings.skip_unprofitable_sales;
        if sale_first {
            actions.push(sell.clone());
        }

        if recoverable <= 0 {
            return Ok(AccountOutcome::Skipped(SkipReason::TransferTooSmall {
                proceeds,
                fee,
                sold_bytes: if sale_first { reclaimable } else { 0 },
            }));
        }

        if !sale_first {
            actions.push(sell);
        }

        actions.push(HostAction::Transfer {
            from: account.clone(),
            to: self.settings.contract.clone(),
            quantity: Asset::new(recoverable, self.settings.core_symbol.clone()),
            memo: self.settings.transfer_memo.clone(),
            authorization,
        });

        Ok(AccountOutcome::Reclaimed {
            bytes_sold: reclaimable,
            proceeds,
            fee,
            recovered: recoverable,
        })
    }
}
