//! Validation and normalization of everything a client sends us.
//!
//! The offer advertises [`EVM_ADDRESS_PATTERN`] and [`AMOUNT_PATTERN`] to the
//! client, but those are hints only. These helpers are the authoritative check.

use std::str::FromStr;

use alloy_primitives::Address;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;

use crate::config::RequestDefaults;
use crate::error::{BetError, BetResult};
use crate::protocol::{parse_condition_id, LAMPORTS_PER_SOL};
use crate::types::{BetIntent, MarketReference};

pub const EVM_ADDRESS_PATTERN: &str = "^0x[a-fA-F0-9]{40}$";
pub const AMOUNT_PATTERN: &str = "^[0-9]+(\\.[0-9]+)?$";
pub const BET_OPTION_SEPARATOR: &str = "__";

/// Query string shared by the offer and order endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionQuery {
    pub to: Option<String>,
    pub amount: Option<String>,
    #[serde(alias = "gameId")]
    pub market_id: Option<String>,
    pub condition_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderBody {
    pub account: String,
    #[serde(default)]
    pub data: OrderData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    pub bet_option: Option<String>,
    pub wallet_address: Option<String>,
    /// Clients send this as either a JSON string or number.
    pub amount: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub to: Pubkey,
    pub stake: Decimal,
    pub market: MarketReference,
}

pub fn resolve_query(query: &ActionQuery, defaults: &RequestDefaults) -> BetResult<ResolvedQuery> {
    let to = match non_empty(&query.to) {
        Some(raw) => parse_source_account(raw)
            .map_err(|_| BetError::invalid("query parameter 'to' is not a Solana address"))?,
        None => defaults.account,
    };
    let stake = match non_empty(&query.amount) {
        Some(raw) => parse_stake(raw)?,
        None => defaults.stake,
    };
    let market = resolve_market(
        non_empty(&query.market_id).unwrap_or(defaults.market_id.as_str()),
        non_empty(&query.condition_id).unwrap_or(defaults.condition_id.as_str()),
    )?;

    Ok(ResolvedQuery { to, stake, market })
}

pub fn resolve_market(market_id: &str, condition_id: &str) -> BetResult<MarketReference> {
    let market_id = market_id.trim();
    if market_id.is_empty() || !market_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BetError::invalid(format!(
            "marketId '{market_id}' is not a decimal identifier"
        )));
    }
    parse_condition_id(condition_id)?;
    Ok(MarketReference {
        market_id: market_id.to_string(),
        condition_id: condition_id.trim().to_string(),
    })
}

pub fn parse_source_account(raw: &str) -> BetResult<Pubkey> {
    Pubkey::from_str(raw.trim())
        .map_err(|_| BetError::invalid(format!("'{raw}' is not a valid Solana account")))
}

pub fn parse_evm_address(raw: &str) -> BetResult<Address> {
    let raw = raw.trim();
    let hex = raw
        .strip_prefix("0x")
        .filter(|h| h.len() == 40 && h.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| BetError::invalid(format!("'{raw}' is not a 0x-prefixed EVM address")))?;
    Address::from_str(hex).map_err(|_| BetError::invalid(format!("'{raw}' is not a valid EVM address")))
}

/// Stake in whole SOL, plain decimal notation only, strictly positive.
pub fn parse_stake(raw: &str) -> BetResult<Decimal> {
    let raw = raw.trim();
    if !is_plain_decimal(raw) {
        return Err(BetError::invalid(format!("amount '{raw}' is not a decimal number")));
    }
    let stake = Decimal::from_str(raw)
        .map_err(|_| BetError::invalid(format!("amount '{raw}' is out of range")))?;
    if stake <= Decimal::ZERO {
        return Err(BetError::invalid("amount must be greater than zero"));
    }
    Ok(stake)
}

/// Stake sent as a JSON number. Floats may serialize in exponent form
/// (`1e-7`), which is converted exactly rather than rejected.
pub fn parse_stake_number(n: &serde_json::Number) -> BetResult<Decimal> {
    let text = n.to_string();
    if !text.contains(['e', 'E']) {
        return parse_stake(&text);
    }
    let stake = Decimal::from_scientific(&text)
        .map_err(|_| BetError::invalid(format!("amount {text} is out of range")))?
        .normalize();
    if stake <= Decimal::ZERO {
        return Err(BetError::invalid("amount must be greater than zero"));
    }
    Ok(stake)
}

/// Floors to whole lamports; a stake that floors to zero is rejected.
pub fn stake_to_lamports(stake: Decimal) -> BetResult<u64> {
    let lamports = stake
        .checked_mul(Decimal::from(LAMPORTS_PER_SOL))
        .and_then(|l| l.trunc().to_u64())
        .ok_or_else(|| BetError::invalid(format!("amount {stake} is out of range")))?;
    if lamports == 0 {
        return Err(BetError::invalid(format!("amount {stake} is smaller than one lamport")));
    }
    Ok(lamports)
}

/// Splits an `"{outcomeId}__{odds}"` token produced by the offer.
pub fn parse_bet_option(raw: &str) -> BetResult<(u64, Decimal)> {
    let bad = || BetError::invalid(format!("betOption '{raw}' must look like '<outcomeId>__<odds>'"));
    let (outcome, odds) = raw.trim().split_once(BET_OPTION_SEPARATOR).ok_or_else(bad)?;

    let outcome_id = outcome.parse::<u64>().map_err(|_| bad())?;
    if !is_plain_decimal(odds) {
        return Err(bad());
    }
    let odds = Decimal::from_str(odds).map_err(|_| bad())?;
    if odds < Decimal::ONE {
        return Err(BetError::invalid(format!("odds {odds} are below even money")));
    }
    Ok((outcome_id, odds))
}

/// Builds a [`BetIntent`] from the raw order request.
///
/// Pure: runs before any upstream call so malformed input never costs a
/// network round trip. A stake in the body wins over one in the query.
pub fn parse_bet_intent(
    query: &ActionQuery,
    body: &OrderBody,
    defaults: &RequestDefaults,
    slippage_bps: u32,
) -> BetResult<BetIntent> {
    let source_account = parse_source_account(&body.account)
        .map_err(|_| BetError::invalid("Invalid \"account\" provided"))?;
    let recipient_placeholder = match non_empty(&query.to) {
        Some(raw) => parse_source_account(raw)
            .map_err(|_| BetError::invalid("query parameter 'to' is not a Solana address"))?,
        None => source_account,
    };

    let wallet = body
        .data
        .wallet_address
        .as_deref()
        .ok_or_else(|| BetError::invalid("walletAddress is required"))?;
    let destination_wallet = parse_evm_address(wallet)?;

    let stake = match body.data.amount.as_ref() {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => parse_stake(s)?,
        Some(serde_json::Value::Number(n)) => parse_stake_number(n)?,
        Some(serde_json::Value::Null) | Some(serde_json::Value::String(_)) | None => {
            match non_empty(&query.amount) {
                Some(raw) => parse_stake(raw)?,
                None => defaults.stake,
            }
        }
        Some(other) => {
            return Err(BetError::invalid(format!("amount {other} is not a number")));
        }
    };
    let stake_lamports = stake_to_lamports(stake)?;

    let bet_option = body
        .data
        .bet_option
        .as_deref()
        .ok_or_else(|| BetError::invalid("betOption is required"))?;
    let (outcome_id, odds_at_selection) = parse_bet_option(bet_option)?;

    let market = resolve_market(
        non_empty(&query.market_id).unwrap_or(defaults.market_id.as_str()),
        non_empty(&query.condition_id).unwrap_or(defaults.condition_id.as_str()),
    )?;

    Ok(BetIntent {
        market,
        outcome_id,
        odds_at_selection,
        stake,
        stake_lamports,
        slippage_bps,
        destination_wallet,
        source_account,
        recipient_placeholder,
    })
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn is_plain_decimal(raw: &str) -> bool {
    let (whole, frac) = match raw.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (raw, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && frac.map_or(true, digits)
}
