use serde::Serialize;

use crate::{
    chain::MarketState,
    error::{ReclaimError, Result},
};

/// Bytes an account must keep after a reclaim
pub const DEFAULT_RESERVED_BYTES: i64 = 3010;

/// Exchange fee is `1 / FEE_DENOMINATOR` of the proceeds, rounded up (0.5%)
pub const DEFAULT_FEE_DENOMINATOR: i64 = 200;

/// Prices RAM sales against the constant-product market
#[derive(Debug, Clone, Copy)]
pub struct RamCalculator {
    reserved_bytes: i64,
    fee_denominator: i64,
}

/// Breakdown of what selling an account's spare RAM would yield
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RamQuote {
    pub owned_bytes: i64,
    pub reclaimable_bytes: i64,
    pub proceeds: i64,
    pub fee: i64,
    pub recoverable: i64,
}

impl RamQuote {
    pub fn is_viable(&self) -> bool {
        self.reclaimable_bytes > 0 && self.proceeds > 0 && self.recoverable > 0
    }
}

impl Default for RamCalculator {
    fn default() -> Self {
        Self {
            reserved_bytes: DEFAULT_RESERVED_BYTES,
            fee_denominator: DEFAULT_FEE_DENOMINATOR,
        }
    }
}

impl RamCalculator {
    pub fn new(reserved_bytes: i64, fee_denominator: i64) -> Result<Self> {
        if reserved_bytes < 0 {
            return Err(ReclaimError::Config(format!(
                "reserved_bytes must not be negative (got {})",
                reserved_bytes
            )));
        }
        if fee_denominator <= 0 {
            return Err(ReclaimError::Config(format!(
                "fee_denominator must be positive (got {})",
                fee_denominator
            )));
        }
        Ok(Self {
            reserved_bytes,
            fee_denominator,
        })
    }

    pub fn reserved_bytes(&self) -> i64 {
        self.reserved_bytes
    }

    /// Bytes that can be sold; zero or negative means nothing to sell
    pub fn reclaimable_bytes(&self, owned_bytes: i64) -> i64 {
        owned_bytes.saturating_sub(self.reserved_bytes)
    }

    /// Currency received for selling `amount` of the base reserve:
    /// `floor(amount * quote / (base + amount))`
    pub fn bancor_output(base: i64, quote: i64, amount: i64) -> Result<i64> {
        let denominator = base as i128 + amount as i128;
        if denominator <= 0 {
            return Err(ReclaimError::InvalidMarket(format!(
                "base reserve {} + amount {} is not positive",
                base, amount
            )));
        }

        let output = (amount as i128 * quote as i128) / denominator;
        i64::try_from(output)
            .map_err(|_| ReclaimError::Overflow(format!("sale output {} exceeds i64", output)))
    }

    /// Exchange fee on `proceeds`, rounded up
    pub fn fee(&self, proceeds: i64) -> i64 {
        let fee = (proceeds as i128 + self.fee_denominator as i128 - 1) / self.fee_denominator as i128;
        fee as i64
    }

    /// Price a sale of everything above the reserve without touching any state
    pub fn quote(&self, owned_bytes: i64, market: &MarketState) -> Result<RamQuote> {
        let reclaimable_bytes = self.reclaimable_bytes(owned_bytes);
        if reclaimable_bytes <= 0 {
            return Ok(RamQuote {
                owned_bytes,
                reclaimable_bytes,
                proceeds: 0,
                fee: 0,
                recoverable: 0,
            });
        }

        let proceeds = Self::bancor_output(
            market.base.amount,
            market.quote.amount,
            reclaimable_bytes,
        )?;
        let fee = self.fee(proceeds);

        Ok(RamQuote {
            owned_bytes,
            reclaimable_bytes,
            proceeds,
            fee,
            recoverable: proceeds - fee,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Asset, Symbol};

    fn market(base: i64, quote: i64) -> MarketState {
        MarketState {
            supply: Asset::new(100_000_000_000_000, Symbol::new("RAMCORE", 4).unwrap()),
            base: Asset::new(base, Symbol::new("RAM", 0).unwrap()),
            quote: Asset::new(quote, Symbol::new("TLOS", 4).unwrap()),
        }
    }

    #[test]
    fn test_reference_sale() {
        let calc = RamCalculator::default();
        let quote = calc.quote(10_000 + 3010, &market(1_000_000, 2_000_000)).unwrap();

        assert_eq!(quote.reclaimable_bytes, 10_000);
        assert_eq!(quote.proceeds, 19_801);
        assert_eq!(quote.fee, 100);
        assert_eq!(quote.recoverable, 19_701);
        assert!(quote.is_viable());
    }

    #[test]
    fn test_below_reserve_is_not_reclaimable() {
        let calc = RamCalculator::default();
        assert_eq!(calc.reclaimable_bytes(3000), -10);
        assert_eq!(calc.reclaimable_bytes(3010), 0);
        assert_eq!(calc.reclaimable_bytes(3011), 1);

        let quote = calc.quote(3000, &market(1_000_000, 2_000_000)).unwrap();
        assert!(!quote.is_viable());
        assert_eq!(quote.proceeds, 0);
    }

    #[test]
    fn test_fee_rounds_up() {
        let calc = RamCalculator::default();
        assert_eq!(calc.fee(0), 0);
        assert_eq!(calc.fee(1), 1);
        assert_eq!(calc.fee(200), 1);
        assert_eq!(calc.fee(201), 2);
        assert_eq!(calc.fee(19_801), 100);
    }

    #[test]
    fn test_tiny_sale_leaves_nothing_after_fee() {
        // one unit of proceeds is eaten entirely by the rounded-up fee
        let calc = RamCalculator::default();
        let quote = calc.quote(3011, &market(1_000_000, 2_000_000)).unwrap();
        assert_eq!(quote.proceeds, 1);
        assert_eq!(quote.fee, 1);
        assert_eq!(quote.recoverable, 0);
        assert!(!quote.is_viable());
    }

    #[test]
    fn test_bancor_output_large_values_do_not_overflow() {
        let out = RamCalculator::bancor_output(i64::MAX / 2, i64::MAX / 2, i64::MAX / 2).unwrap();
        assert_eq!(out, (i64::MAX / 2) / 2);
    }

    #[test]
    fn test_bancor_output_rejects_empty_market() {
        assert!(RamCalculator::bancor_output(0, 1_000, 0).is_err());
    }

    #[test]
    fn test_custom_parameters() {
        let calc = RamCalculator::new(0, 100).unwrap();
        assert_eq!(calc.reclaimable_bytes(500), 500);
        assert_eq!(calc.fee(150), 2);

        assert!(RamCalculator::new(-1, 200).is_err());
        assert!(RamCalculator::new(3010, 0).is_err());
    }
}
