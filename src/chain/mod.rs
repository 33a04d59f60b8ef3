pub mod asset;
pub mod ledger;
pub mod name;
pub mod ram;
pub mod snapshot;

pub use asset::{Asset, PermissionLevel, Symbol};
pub use ledger::{HostAction, Ledger, MarketState, ResourceEntry};
pub use name::AccountName;
pub use ram::{RamCalculator, RamQuote};
pub use snapshot::{LedgerState, SnapshotLedger};

#[cfg(test)]
pub use ledger::MockLedger;
