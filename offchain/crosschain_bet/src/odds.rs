//! Slippage guard on the odds a bet may be filled at.
//!
//! `min = 1 + (odds - 1) * (1 - tolerance)`: only the winning part of the
//! payout is discounted, so the guard never drops below even money. The
//! result is floored to [`ODDS_DECIMALS`] digits and handed to the sportsbook
//! as a fixed-point integer.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{BetError, BetResult};
use crate::protocol::ODDS_DECIMALS;

pub const BPS_DENOMINATOR: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinOddsGuard {
    /// Decimal odds, already floored to the protocol precision.
    pub min_acceptable: Decimal,
    /// `min_acceptable * 10^ODDS_DECIMALS`
    pub raw: u64,
}

pub fn min_acceptable_odds(current_odds: Decimal, slippage_bps: u32) -> BetResult<MinOddsGuard> {
    if current_odds < Decimal::ONE {
        return Err(BetError::invalid(format!(
            "odds {current_odds} are below even money"
        )));
    }
    if slippage_bps >= BPS_DENOMINATOR {
        return Err(BetError::invalid(format!(
            "slippage of {slippage_bps} bps must be below {BPS_DENOMINATOR}"
        )));
    }

    let keep = Decimal::from(BPS_DENOMINATOR - slippage_bps) / Decimal::from(BPS_DENOMINATOR);
    let overflow = || BetError::invalid(format!("odds {current_odds} are out of range"));

    let winnings = (current_odds - Decimal::ONE)
        .checked_mul(keep)
        .ok_or_else(overflow)?;
    let min_acceptable = (Decimal::ONE + winnings)
        .round_dp_with_strategy(ODDS_DECIMALS, RoundingStrategy::ToZero);

    let raw = min_acceptable
        .checked_mul(Decimal::from(10u64.pow(ODDS_DECIMALS)))
        .and_then(|scaled| scaled.trunc().to_u64())
        .ok_or_else(overflow)?;

    Ok(MinOddsGuard {
        min_acceptable,
        raw,
    })
}
