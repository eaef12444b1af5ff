// offchain/crosschain_bet/src/protocol.rs
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall, SolType, SolValue};
use serde_json::json;

use crate::error::{BetError, BetResult};

/// Odds on the destination sportsbook carry 12 fractional digits.
pub const ODDS_DECIMALS: u32 = 12;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// deBridge's internal chain id for Solana (not the EVM-style id).
pub const SOLANA_BRIDGE_CHAIN_ID: u64 = 7_565_164;
pub const POLYGON_CHAIN_ID: u64 = 137;

/// External call envelope version understood by the bridge for EVM targets.
pub const EXTERNAL_CALL_VERSION: &str = "evm_1";

sol! {
    /// Bet parameters attached to every sportsbook bet.
    struct BetData {
        address affiliate;
        uint64 minOdds;
        bytes data;
    }

    /// `(conditionId, outcomeId)` pair the sportsbook core decodes from `BetData.data`.
    struct ConditionOutcome {
        uint256 conditionId;
        uint64 outcomeId;
    }

    /// Liquidity pool entry point that places a bet on behalf of `bettor`.
    function betFor(
        address bettor,
        address core,
        uint128 amount,
        uint64 expiresAt,
        BetData betData
    ) external returns (uint256 tokenId);
}

/// Parses a decimal condition id as it appears in the market feed.
pub fn parse_condition_id(raw: &str) -> BetResult<U256> {
    let digits = raw.trim();
    let not_decimal = || BetError::invalid(format!("conditionId '{raw}' is not a decimal integer"));
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_decimal());
    }
    U256::from_str_radix(digits, 10).map_err(|_| not_decimal())
}

pub fn encode_condition_outcome(condition_id: U256, outcome_id: u64) -> Bytes {
    ConditionOutcome {
        conditionId: condition_id,
        outcomeId: outcome_id,
    }
    .abi_encode()
    .into()
}

pub fn decode_condition_outcome(data: &[u8]) -> BetResult<(U256, u64)> {
    let decoded = <ConditionOutcome as SolType>::abi_decode(data, true)
        .map_err(|e| BetError::invalid(format!("bad condition payload: {e}")))?;
    Ok((decoded.conditionId, decoded.outcomeId))
}

/// Arguments of a `betFor` call, already converted to destination units.
#[derive(Debug, Clone)]
pub struct BetForArgs {
    pub bettor: Address,
    pub core: Address,
    pub amount: u128,
    pub expires_at: u64,
    pub affiliate: Address,
    pub min_odds: u64,
    pub condition_id: U256,
    pub outcome_id: u64,
}

pub fn encode_bet_for(args: &BetForArgs) -> Bytes {
    betForCall {
        bettor: args.bettor,
        core: args.core,
        amount: args.amount,
        expiresAt: args.expires_at,
        betData: BetData {
            affiliate: args.affiliate,
            minOdds: args.min_odds,
            data: encode_condition_outcome(args.condition_id, args.outcome_id),
        },
    }
    .abi_encode()
    .into()
}

/// JSON envelope the bridge expects in its `externalCall` query parameter.
pub fn external_call_envelope(target: Address, call_data: &Bytes) -> String {
    json!({
        "version": EXTERNAL_CALL_VERSION,
        "fields": {
            "to": target.to_checksum(None),
            "data": call_data.to_string(),
        }
    })
    .to_string()
}
