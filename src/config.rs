use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    chain::{AccountName, RamCalculator, Symbol},
    chain::ram::{DEFAULT_FEE_DENOMINATOR, DEFAULT_RESERVED_BYTES},
    error::{ReclaimError, Result},
};

/// Memo attached to every recovery transfer
pub const DEFAULT_TRANSFER_MEMO: &str =
    "Recovering RAM per TBNOA: https://chainspector.io/dashboard/ratify-proposals/0";

/// Prefix for environment overrides, e.g. `RAM_RECLAIM__RECLAIM__BATCH_SIZE=20`
pub const ENV_PREFIX: &str = "RAM_RECLAIM";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub reclaim: ReclaimConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContractConfig {
    /// Account the contract runs as; proceeds are sent here
    pub account: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChainConfig {
    /// Permission used to authorize actions on behalf of queued accounts
    pub permission: String,
    /// RAM market symbol, `precision,CODE`
    pub ram_market_symbol: String,
    /// Core currency symbol, `precision,CODE`
    pub core_symbol: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReclaimConfig {
    pub reserved_bytes: i64,
    pub fee_denominator: i64,
    pub transfer_memo: String,
    pub batch_size: u8,
    pub batch_delay_ms: u64,
    /// Hold back the sell action until the net transfer is known to be positive
    #[serde(default)]
    pub skip_unprofitable_sales: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LedgerConfig {
    pub snapshot_path: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            account: "ramreclaimer".to_string(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            permission: "active".to_string(),
            ram_market_symbol: "4,RAMCORE".to_string(),
            core_symbol: "4,TLOS".to_string(),
        }
    }
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            reserved_bytes: DEFAULT_RESERVED_BYTES,
            fee_denominator: DEFAULT_FEE_DENOMINATOR,
            transfer_memo: DEFAULT_TRANSFER_MEMO.to_string(),
            batch_size: 10,
            batch_delay_ms: 500,
            skip_unprofitable_sales: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "ram-reclaim.db".to_string(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "ledger.json".to_string(),
        }
    }
}

/// Validated, typed view of the settings the reclaim core needs
#[derive(Debug, Clone)]
pub struct ReclaimSettings {
    pub contract: AccountName,
    pub permission: String,
    pub market_symbol: Symbol,
    pub core_symbol: Symbol,
    pub calculator: RamCalculator,
    pub transfer_memo: String,
    pub skip_unprofitable_sales: bool,
}

impl Config {
    /// Defaults, then the TOML file at `path` (if present), then `RAM_RECLAIM__*` variables
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Render the configuration as a TOML document
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn contract_account(&self) -> Result<AccountName> {
        self.contract
            .account
            .parse()
            .map_err(|e| ReclaimError::Config(format!("contract.account: {}", e)))
    }

    pub fn market_symbol(&self) -> Result<Symbol> {
        self.chain
            .ram_market_symbol
            .parse()
            .map_err(|e| ReclaimError::Config(format!("chain.ram_market_symbol: {}", e)))
    }

    pub fn core_symbol(&self) -> Result<Symbol> {
        self.chain
            .core_symbol
            .parse()
            .map_err(|e| ReclaimError::Config(format!("chain.core_symbol: {}", e)))
    }

    pub fn calculator(&self) -> Result<RamCalculator> {
        RamCalculator::new(self.reclaim.reserved_bytes, self.reclaim.fee_denominator)
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.database.path)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(&self.ledger.snapshot_path)
    }

    pub fn settings(&self) -> Result<ReclaimSettings> {
        if self.chain.permission.is_empty() {
            return Err(ReclaimError::Config("chain.permission is empty".to_string()));
        }

        Ok(ReclaimSettings {
            contract: self.contract_account()?,
            permission: self.chain.permission.clone(),
            market_symbol: self.market_symbol()?,
            core_symbol: self.core_symbol()?,
            calculator: self.calculator()?,
            transfer_memo: self.reclaim.transfer_memo.clone(),
            skip_unprofitable_sales: self.reclaim.skip_unprofitable_sales,
        })
    }
}
