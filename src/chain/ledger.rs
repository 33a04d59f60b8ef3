use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    chain::{AccountName, Asset, PermissionLevel, Symbol},
    error::Result,
};

/// RAM allocation the host ledger tracks for an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub owner: AccountName,
    pub ram_bytes: i64,
}

/// Reserves of the RAM/currency exchange
///
/// `base` holds the RAM reserve in bytes, `quote` the currency reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    pub supply: Asset,
    pub base: Asset,
    pub quote: Asset,
}

/// Outbound mutation handed to the host ledger.
///
/// Once dispatched these are irreversible from this side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostAction {
    SellRam {
        account: AccountName,
        bytes: i64,
        authorization: PermissionLevel,
    },
    Transfer {
        from: AccountName,
        to: AccountName,
        quantity: Asset,
        memo: String,
        authorization: PermissionLevel,
    },
}

impl HostAction {
    /// Account the action is executed on behalf of
    pub fn account(&self) -> &AccountName {
        match self {
            HostAction::SellRam { account, .. } => account,
            HostAction::Transfer { from, .. } => from,
        }
    }
}

impl fmt::Display for HostAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostAction::SellRam { account, bytes, authorization } => {
                write!(f, "sellram({}, {} bytes) [{}]", account, bytes, authorization)
            }
            HostAction::Transfer { from, to, quantity, memo, authorization } => {
                write!(
                    f,
                    "transfer({} -> {}, {}, \"{}\") [{}]",
                    from, to, quantity, memo, authorization
                )
            }
        }
    }
}

/// Host ledger collaborator: resource/market registries plus action execution
#[cfg_attr(test, mockall::automock)]
pub trait Ledger {
    /// RAM allocation of `account`, `None` when the host has no entry
    fn resource_entry(&self, account: &AccountName) -> Result<Option<ResourceEntry>>;

    /// Exchange reserves for the market identified by `symbol`
    fn market(&self, symbol: &Symbol) -> Result<Option<MarketState>>;

    /// Execute `actions` in order. Either all are accepted or none are.
    fn dispatch(&mut self, actions: &[HostAction]) -> Result<()>;
}
