use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{
    chain::{
        AccountName, Asset, HostAction, Ledger, MarketState, RamCalculator, ResourceEntry, Symbol,
    },
    error::{ReclaimError, Result},
};

/// Serialized view of the host ledger state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    /// RAM bytes owned per account
    #[serde(default)]
    pub resources: BTreeMap<AccountName, i64>,
    /// Currency balances per account, in the core symbol's smallest unit
    #[serde(default)]
    pub balances: BTreeMap<AccountName, i64>,
    /// Exchange reserves keyed by market symbol code
    #[serde(default)]
    pub markets: BTreeMap<String, MarketState>,
    /// Every action accepted so far, in execution order
    #[serde(default)]
    pub executed: Vec<HostAction>,
}

/// File-backed ledger used to run reclaim batches off-chain
pub struct SnapshotLedger {
    state: LedgerState,
    path: Option<PathBuf>,
    calculator: RamCalculator,
    market_symbol: Symbol,
}

impl SnapshotLedger {
    /// In-memory ledger, never written to disk
    pub fn new(state: LedgerState, calculator: RamCalculator, market_symbol: Symbol) -> Self {
        Self {
            state,
            path: None,
            calculator,
            market_symbol,
        }
    }

    /// Load a snapshot from `path`; a missing file starts an empty ledger
    pub fn open(path: &Path, calculator: RamCalculator, market_symbol: Symbol) -> Result<Self> {
        let state = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        } else {
            info!("Ledger snapshot {} not found, starting empty", path.display());
            LedgerState::default()
        };

        Ok(Self {
            state,
            path: Some(path.to_path_buf()),
            calculator,
            market_symbol,
        })
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            let raw = serde_json::to_string_pretty(&self.state)?;
            std::fs::write(path, raw)?;
            debug!("Ledger snapshot written to {}", path.display());
        }
        Ok(())
    }

    /// Apply one action to `state`. Sales are priced against `opening`, the
    /// reserves as they stood before the dispatch, so every sale of a batch
    /// pays what the batch was quoted.
    fn apply(
        &self,
        state: &mut LedgerState,
        opening: Option<&MarketState>,
        action: &HostAction,
    ) -> Result<()> {
        let signer = match action {
            HostAction::SellRam { authorization, .. } | HostAction::Transfer { authorization, .. } => {
                &authorization.actor
            }
        };
        if signer != action.account() {
            return Err(ReclaimError::ActionRejected(format!(
                "missing authority of {}",
                action.account()
            )));
        }

        match action {
            HostAction::SellRam { account, bytes, .. } => {
                let owned = state
                    .resources
                    .get_mut(account)
                    .ok_or_else(|| ReclaimError::NoResourceEntry(account.clone()))?;
                if *bytes <= 0 || *bytes > *owned {
                    return Err(ReclaimError::ActionRejected(format!(
                        "{} cannot sell {} of {} bytes",
                        account, bytes, owned
                    )));
                }

                let opening =
                    opening.ok_or_else(|| ReclaimError::NoRamMarket(self.market_symbol.to_string()))?;
                let proceeds =
                    RamCalculator::bancor_output(opening.base.amount, opening.quote.amount, *bytes)?;
                if proceeds <= 0 {
                    return Err(ReclaimError::ActionRejected(format!(
                        "token amount received from selling ram is too low ({})",
                        account
                    )));
                }

                let market = state
                    .markets
                    .get_mut(&self.market_symbol.code)
                    .ok_or_else(|| ReclaimError::NoRamMarket(self.market_symbol.to_string()))?;
                if market.quote.amount < proceeds {
                    return Err(ReclaimError::ActionRejected(format!(
                        "RAM market cannot pay {} for {} bytes",
                        Asset::new(proceeds, market.quote.symbol.clone()),
                        bytes
                    )));
                }
                let fee = self.calculator.fee(proceeds);

                *owned -= bytes;
                market.base.amount += bytes;
                market.quote.amount -= proceeds;
                *state.balances.entry(account.clone()).or_insert(0) += proceeds - fee;
            }
            HostAction::Transfer { from, to, quantity, .. } => {
                if quantity.amount <= 0 {
                    return Err(ReclaimError::ActionRejected(format!(
                        "must transfer positive quantity ({})",
                        quantity
                    )));
                }
                let balance = state.balances.get(from).copied().unwrap_or(0);
                if balance < quantity.amount {
                    return Err(ReclaimError::ActionRejected(format!(
                        "overdrawn balance: {} has {} but sends {}",
                        from,
                        Asset::new(balance, quantity.symbol.clone()),
                        quantity
                    )));
                }
                state.balances.insert(from.clone(), balance - quantity.amount);
                *state.balances.entry(to.clone()).or_insert(0) += quantity.amount;
            }
        }

        state.executed.push(action.clone());
        Ok(())
    }
}

impl Ledger for SnapshotLedger {
    fn resource_entry(&self, account: &AccountName) -> Result<Option<ResourceEntry>> {
        Ok(self.state.resources.get(account).map(|ram_bytes| ResourceEntry {
            owner: account.clone(),
            ram_bytes: *ram_bytes,
        }))
    }

    fn market(&self, symbol: &Symbol) -> Result<Option<MarketState>> {
        Ok(self.state.markets.get(&symbol.code).cloned())
    }

    fn dispatch(&mut self, actions: &[HostAction]) -> Result<()> {
        if actions.is_empty() {
            return Ok(());
        }

        let opening = self.state.markets.get(&self.market_symbol.code).cloned();
        let mut next = self.state.clone();
        for action in actions {
            self.apply(&mut next, opening.as_ref(), action)?;
            debug!("Executed {}", action);
        }

        self.state = next;
        self.save()
    }
}
