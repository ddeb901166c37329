//! Position records, leverage tiers and settlement results.

use super::{Asset, Bps, Decimal, ExchangeRate, Owner, PositionId, Timestamp};
use serde::{Deserialize, Serialize};

/// An allowed leverage multiplier and how its leveraged exposure is funded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageTier {
    /// Leverage in basis points of 1.0x (15_000 == 1.5x).
    pub factor_bps: u32,
    /// Share of the leveraged exposure the user deposits in quote asset;
    /// the rest is borrowed from the lending facility.
    pub deposit_share: Bps,
}

/// Allowed tiers, ascending. The last entry is the maximum leverage.
pub const LEVERAGE_TIERS: [LeverageTier; 2] = [
    LeverageTier {
        factor_bps: 15_000,
        deposit_share: Bps(5_000),
    },
    LeverageTier {
        factor_bps: 20_000,
        deposit_share: Bps(0),
    },
];

impl LeverageTier {
    pub fn factor(&self) -> Decimal {
        Decimal::from_scaled(self.factor_bps as i64, 4)
    }

    /// Exact tier match for a requested factor.
    pub fn for_factor(factor: Decimal) -> Option<LeverageTier> {
        LEVERAGE_TIERS.iter().copied().find(|t| t.factor() == factor)
    }

    pub fn max() -> LeverageTier {
        LEVERAGE_TIERS[LEVERAGE_TIERS.len() - 1]
    }

    pub fn is_max(&self) -> bool {
        self.factor_bps == Self::max().factor_bps
    }
}

/// A leveraged position owned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: PositionId,
    pub owner: Owner,
    pub base_asset: Asset,
    /// Base asset currently locked, net of the open fee.
    pub collateral: Decimal,
    /// Quote owed to the lending facility, excluding interest.
    pub borrowed_principal: Decimal,
    /// Quote the user contributed directly at open.
    pub deposited_quote: Decimal,
    pub leverage_factor: Decimal,
    /// Cost basis for yield; never changes after open.
    pub entry_exchange_rate: ExchangeRate,
    pub entry_price: Decimal,
    /// Base asset charged as the open fee.
    pub open_fee: Decimal,
    pub opened_at: Timestamp,
    pub closed_at: Option<Timestamp>,
    pub is_open: bool,
}

impl Position {
    /// Quote value of the collateral at `price`.
    pub fn collateral_value(&self, price: Decimal) -> Option<Decimal> {
        self.collateral.checked_mul(price)
    }
}

/// Outcome of a full or partial close.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResult {
    /// Base asset handed back: closed collateral plus yield, net of fees.
    pub base_returned: Decimal,
    /// Deposited quote handed back after interest; never negative.
    pub quote_returned: Decimal,
    pub principal_fee: Decimal,
    pub yield_fee: Decimal,
    pub yield_earned: Decimal,
    pub interest_owed: Decimal,
    /// Interest not covered by the deposited quote share.
    pub interest_shortfall: Decimal,
    /// Borrowed principal plus interest sent to the facility.
    pub repaid_to_facility: Decimal,
    pub vault_fee_share: Decimal,
    pub protocol_fee_share: Decimal,
    pub closed_collateral: Decimal,
    pub closed_collateral_value: Decimal,
    pub is_partial: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_lookup() {
        let tier = LeverageTier::for_factor(Decimal::from_scaled(15, 1)).unwrap();
        assert_eq!(tier.deposit_share, Bps(5_000));
        assert!(!tier.is_max());

        let tier = LeverageTier::for_factor(Decimal::from_i64(2)).unwrap();
        assert_eq!(tier.deposit_share, Bps(0));
        assert!(tier.is_max());
    }

    #[test]
    fn test_tier_lookup_rejects_unlisted_factors() {
        assert!(LeverageTier::for_factor(Decimal::one()).is_none());
        assert!(LeverageTier::for_factor(Decimal::from_scaled(175, 2)).is_none());
        assert!(LeverageTier::for_factor(Decimal::from_i64(3)).is_none());
    }

    #[test]
    fn test_tiers_are_ascending_and_above_one() {
        for pair in LEVERAGE_TIERS.windows(2) {
            assert!(pair[0].factor_bps < pair[1].factor_bps);
        }
        assert!(LEVERAGE_TIERS.iter().all(|t| t.factor() > Decimal::one()));
    }

    #[test]
    fn test_settlement_serializes_camel_case() {
        let json = serde_json::to_value(SettlementResult::default()).unwrap();
        assert!(json.get("baseReturned").is_some());
        assert!(json.get("repaidToFacility").is_some());
    }
}
