// offchain/crosschain_bet/src/config.rs
use std::{env, net::SocketAddr, str::FromStr};

use alloy_primitives::Address;
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;

use crate::error::{BetError, BetResult};
use crate::odds::BPS_DENOMINATOR;
use crate::protocol::{POLYGON_CHAIN_ID, SOLANA_BRIDGE_CHAIN_ID};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_ALLOWED_ORIGIN: &str = "https://dial.to";
const DEFAULT_MARKET_GRAPHQL_URL: &str =
    "https://thegraph.azuro.org/subgraphs/name/azuro-protocol/azuro-api-polygon-v3";
const DEFAULT_BRIDGE_API_URL: &str = "https://api.dln.trade/v1.0";
/// DLN source-chain program on Solana.
const DEFAULT_BRIDGE_PROGRAM_ID: &str = "src5qyZHqTqecJV4aY6Cb6zDZLMDzrDKKezs22MPHr4";
const DEFAULT_AFFILIATE: &str = "0x39861ad41e6e4c43ed8c3423be5ef6faf91a3f84";
const DEFAULT_SLIPPAGE_BPS: u32 = 500;
const DEFAULT_DEADLINE_SECS: u64 = 2000;
const DEFAULT_MARKET_ID: &str = "1001000000001595771060";
const DEFAULT_CONDITION_ID: &str = "100110010000000015957710600000000000000386328164";
const DEFAULT_ACCOUNT: &str = "FWXHZxDocgchBjADAxSuyPCVhh6fNLT7DUggabAsuz1y";
const DEFAULT_STAKE: &str = "0.1";

const ACTION_VERSION: &str = "2.1.3";
const SOLANA_MAINNET_CAIP2: &str = "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp";

/// Headers stamped on every response, built once at start-up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionHeaders {
    pub allowed_origin: String,
    pub allow_methods: String,
    pub allow_headers: String,
    pub action_version: String,
    pub blockchain_ids: String,
}

impl ActionHeaders {
    pub fn for_origin(origin: impl Into<String>) -> Self {
        Self {
            allowed_origin: origin.into(),
            allow_methods: "GET, POST, OPTIONS".to_string(),
            allow_headers: "Content-Type".to_string(),
            action_version: ACTION_VERSION.to_string(),
            blockchain_ids: SOLANA_MAINNET_CAIP2.to_string(),
        }
    }
}

/// Fallbacks for query parameters the client leaves out.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDefaults {
    pub market_id: String,
    pub condition_id: String,
    pub account: Pubkey,
    pub stake: Decimal,
}

/// Everything the order pipeline needs to know about both chains.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderSettings {
    /// Sportsbook liquidity pool that receives the `betFor` call.
    pub lp_address: Address,
    pub core_address: Address,
    pub destination_token: Address,
    pub affiliate: Address,
    pub bridge_program_id: Pubkey,
    pub slippage_bps: u32,
    pub deadline_secs: u64,
    pub source_chain_id: u64,
    pub destination_chain_id: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub public_base_url: String,
    pub headers: ActionHeaders,
    pub market_graphql_url: String,
    pub bridge_api_url: String,
    pub solana_rpc_url: String,
    pub order: OrderSettings,
    pub defaults: RequestDefaults,
}

impl Config {
    pub fn from_env() -> BetResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> BetResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| BetError::config(format!("{key} must be set")))
        };
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let order = OrderSettings {
            lp_address: parse_var("LP_ADDRESS", &required("LP_ADDRESS")?)?,
            core_address: parse_var("CORE_ADDRESS", &required("CORE_ADDRESS")?)?,
            destination_token: parse_var("DESTINATION_TOKEN", &required("DESTINATION_TOKEN")?)?,
            affiliate: parse_var("AFFILIATE_ADDRESS", &or_default("AFFILIATE_ADDRESS", DEFAULT_AFFILIATE))?,
            bridge_program_id: parse_var(
                "BRIDGE_PROGRAM_ID",
                &or_default("BRIDGE_PROGRAM_ID", DEFAULT_BRIDGE_PROGRAM_ID),
            )?,
            slippage_bps: match get("SLIPPAGE_BPS") {
                Some(raw) => parse_var("SLIPPAGE_BPS", &raw)?,
                None => DEFAULT_SLIPPAGE_BPS,
            },
            deadline_secs: match get("BET_DEADLINE_SECS") {
                Some(raw) => parse_var("BET_DEADLINE_SECS", &raw)?,
                None => DEFAULT_DEADLINE_SECS,
            },
            source_chain_id: match get("SOURCE_CHAIN_ID") {
                Some(raw) => parse_var("SOURCE_CHAIN_ID", &raw)?,
                None => SOLANA_BRIDGE_CHAIN_ID,
            },
            destination_chain_id: match get("DESTINATION_CHAIN_ID") {
                Some(raw) => parse_var("DESTINATION_CHAIN_ID", &raw)?,
                None => POLYGON_CHAIN_ID,
            },
        };
        if order.slippage_bps >= BPS_DENOMINATOR {
            return Err(BetError::config(format!(
                "SLIPPAGE_BPS must be below {BPS_DENOMINATOR}"
            )));
        }
        if order.deadline_secs == 0 {
            return Err(BetError::config("BET_DEADLINE_SECS must be positive"));
        }

        let defaults = RequestDefaults {
            market_id: or_default("DEFAULT_MARKET_ID", DEFAULT_MARKET_ID),
            condition_id: or_default("DEFAULT_CONDITION_ID", DEFAULT_CONDITION_ID),
            account: parse_var("DEFAULT_ACCOUNT", &or_default("DEFAULT_ACCOUNT", DEFAULT_ACCOUNT))?,
            stake: parse_var("DEFAULT_STAKE", &or_default("DEFAULT_STAKE", DEFAULT_STAKE))?,
        };
        if defaults.stake <= Decimal::ZERO {
            return Err(BetError::config("DEFAULT_STAKE must be positive"));
        }

        Ok(Self {
            listen_addr: parse_var("LISTEN_ADDR", &or_default("LISTEN_ADDR", DEFAULT_LISTEN_ADDR))?,
            public_base_url: or_default("PUBLIC_BASE_URL", DEFAULT_PUBLIC_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            headers: ActionHeaders::for_origin(or_default("ALLOWED_ORIGIN", DEFAULT_ALLOWED_ORIGIN)),
            market_graphql_url: or_default("MARKET_GRAPHQL_URL", DEFAULT_MARKET_GRAPHQL_URL),
            bridge_api_url: or_default("BRIDGE_API_URL", DEFAULT_BRIDGE_API_URL)
                .trim_end_matches('/')
                .to_string(),
            solana_rpc_url: required("SOLANA_RPC")?,
            order,
            defaults,
        })
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> BetResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| BetError::config(format!("{key} has an invalid value '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("LP_ADDRESS", "0x7043E4e1c4045424858ECBCED80989FeAfC11B36"),
            ("CORE_ADDRESS", "0xA40F8D69D412b79b49EAbdD5cf1b5706395bfCf7"),
            ("DESTINATION_TOKEN", "0xc2132d05d31c914a87c6611c10748aeb04b58e8f"),
            ("SOLANA_RPC", "https://api.devnet.solana.com"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> BetResult<Config> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn applies_defaults() {
        let cfg = load(&base_env()).unwrap();
        assert_eq!(cfg.order.slippage_bps, 500);
        assert_eq!(cfg.order.deadline_secs, 2000);
        assert_eq!(cfg.order.source_chain_id, 7_565_164);
        assert_eq!(cfg.order.destination_chain_id, 137);
        assert_eq!(cfg.headers.allowed_origin, "https://dial.to");
        assert_eq!(cfg.defaults.market_id, DEFAULT_MARKET_ID);
        assert_eq!(cfg.defaults.stake, Decimal::new(1, 1));
        assert_eq!(cfg.listen_addr.port(), 3000);
    }

    #[test]
    fn missing_destination_addresses_fail_fast() {
        for key in ["LP_ADDRESS", "CORE_ADDRESS", "DESTINATION_TOKEN", "SOLANA_RPC"] {
            let mut env = base_env();
            env.remove(key);
            match load(&env) {
                Err(BetError::Configuration(msg)) => assert!(msg.contains(key)),
                other => panic!("expected configuration error for {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn blank_required_value_counts_as_missing() {
        let mut env = base_env();
        env.insert("CORE_ADDRESS", "  ");
        assert!(matches!(load(&env), Err(BetError::Configuration(_))));
    }

    #[test]
    fn rejects_malformed_values() {
        let mut env = base_env();
        env.insert("LP_ADDRESS", "not-an-address");
        assert!(matches!(load(&env), Err(BetError::Configuration(_))));

        let mut env = base_env();
        env.insert("SLIPPAGE_BPS", "10000");
        assert!(matches!(load(&env), Err(BetError::Configuration(_))));

        let mut env = base_env();
        env.insert("DEFAULT_ACCOUNT", "0xnotsolana");
        assert!(matches!(load(&env), Err(BetError::Configuration(_))));
    }
}
