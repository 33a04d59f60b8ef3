use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{chain::AccountName, error::ReclaimError};

/// Maximum length of a symbol code
pub const MAX_SYMBOL_LEN: usize = 7;

/// Maximum decimal precision an asset can carry
pub const MAX_PRECISION: u8 = 18;

/// Token or resource symbol, e.g. `4,TLOS` or `4,RAMCORE`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    pub code: String,
    pub precision: u8,
}

impl Symbol {
    pub fn new(code: &str, precision: u8) -> crate::error::Result<Self> {
        if code.is_empty() || code.len() > MAX_SYMBOL_LEN {
            return Err(ReclaimError::InvalidSymbol(format!(
                "code '{}' must be 1 to {} characters",
                code, MAX_SYMBOL_LEN
            )));
        }
        if !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ReclaimError::InvalidSymbol(format!(
                "code '{}' must be uppercase letters only",
                code
            )));
        }
        if precision > MAX_PRECISION {
            return Err(ReclaimError::InvalidSymbol(format!(
                "precision {} exceeds {}",
                precision, MAX_PRECISION
            )));
        }
        Ok(Self {
            code: code.to_string(),
            precision,
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

impl FromStr for Symbol {
    type Err = ReclaimError;

    /// Parses the `precision,CODE` form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| ReclaimError::InvalidSymbol(format!("'{}' is not 'precision,CODE'", s)))?;
        let precision = precision
            .trim()
            .parse::<u8>()
            .map_err(|e| ReclaimError::InvalidSymbol(format!("'{}': {}", s, e)))?;
        Symbol::new(code.trim(), precision)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ReclaimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

/// Integer amount of a symbol, scaled by the symbol's precision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();

        if self.symbol.precision == 0 {
            return write!(f, "{}{} {}", sign, abs, self.symbol.code);
        }

        let scale = 10u64.pow(self.symbol.precision as u32);
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            abs / scale,
            abs % scale,
            self.symbol.code,
            width = self.symbol.precision as usize
        )
    }
}

/// Actor/permission pair authorizing an outbound action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: AccountName,
    pub permission: String,
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.actor, self.permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_display() {
        let tlos = Symbol::new("TLOS", 4).unwrap();
        assert_eq!(Asset::new(19701, tlos.clone()).to_string(), "1.9701 TLOS");
        assert_eq!(Asset::new(5, tlos.clone()).to_string(), "0.0005 TLOS");
        assert_eq!(Asset::new(-12345, tlos).to_string(), "-1.2345 TLOS");

        let bytes = Symbol::new("RAM", 0).unwrap();
        assert_eq!(Asset::new(3010, bytes).to_string(), "3010 RAM");
    }

    #[test]
    fn test_symbol_parse() {
        let sym: Symbol = "4,RAMCORE".parse().unwrap();
        assert_eq!(sym.code, "RAMCORE");
        assert_eq!(sym.precision, 4);
        assert_eq!(sym.to_string(), "4,RAMCORE");

        assert!("TLOS".parse::<Symbol>().is_err());
        assert!("4,tlos".parse::<Symbol>().is_err());
        assert!("4,TOOLONGX".parse::<Symbol>().is_err());
        assert!("40,TLOS".parse::<Symbol>().is_err());
    }

    #[test]
    fn test_asset_json_validates_symbol() {
        let asset: Asset = serde_json::from_str(r#"{"amount":19701,"symbol":"4,TLOS"}"#).unwrap();
        assert_eq!(asset.to_string(), "1.9701 TLOS");
        assert_eq!(
            serde_json::to_string(&asset).unwrap(),
            r#"{"amount":19701,"symbol":"4,TLOS"}"#
        );

        // would overflow the display scale if accepted
        assert!(serde_json::from_str::<Asset>(r#"{"amount":1,"symbol":"25,TLOS"}"#).is_err());
        assert!(serde_json::from_str::<Asset>(r#"{"amount":1,"symbol":"4,tlos"}"#).is_err());
    }
}
