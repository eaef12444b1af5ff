// offchain/crosschain_bet/src/types.rs
use alloy_primitives::{Address, Bytes};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::{hash::Hash, instruction::Instruction, pubkey::Pubkey};

/// Upstream numbers arrive as JSON strings (BigInt/BigDecimal) or plain JSON numbers.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    pub fn as_text(&self) -> String {
        match self {
            Scalar::Text(s) => s.trim().to_string(),
            Scalar::Number(n) => n.to_string(),
        }
    }
}

/// Upstream identifiers of the game and the condition (outcome group) to bet on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketReference {
    pub market_id: String,
    pub condition_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarketStatus {
    Created,
    Closed,
    Resolved,
    Unknown,
}

impl MarketStatus {
    pub fn from_feed(raw: &str) -> Self {
        match raw {
            "Created" => MarketStatus::Created,
            "Resolved" => MarketStatus::Resolved,
            "Closed" | "Paused" | "Canceled" => MarketStatus::Closed,
            _ => MarketStatus::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Participant {
    pub name: String,
    pub image: Option<String>,
    pub sort_order: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub outcome_id: u64,
    pub current_odds: Decimal,
    pub sort_order: i64,
}

/// Live state of one game and one of its conditions. Stale as soon as it is read.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketSnapshot {
    pub status: MarketStatus,
    pub title: Option<String>,
    pub sport: String,
    pub league: String,
    /// Unix seconds.
    pub starts_at: i64,
    pub participants: Vec<Participant>,
    /// `None` when the requested condition is not part of the game any more.
    pub condition_id: Option<String>,
    pub outcomes: Vec<Outcome>,
}

impl MarketSnapshot {
    pub fn is_open(&self) -> bool {
        self.status == MarketStatus::Created
            && self.condition_id.is_some()
            && !self.outcomes.is_empty()
    }

    pub fn home(&self) -> Option<&Participant> {
        self.participants.first()
    }

    pub fn away(&self) -> Option<&Participant> {
        self.participants.get(1)
    }

    pub fn outcome(&self, outcome_id: u64) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.outcome_id == outcome_id)
    }
}

/// A validated bet, built from untrusted client input by [`crate::input`].
#[derive(Clone, Debug, PartialEq)]
pub struct BetIntent {
    pub market: MarketReference,
    pub outcome_id: u64,
    pub odds_at_selection: Decimal,
    /// Whole SOL.
    pub stake: Decimal,
    pub stake_lamports: u64,
    pub slippage_bps: u32,
    pub destination_wallet: Address,
    pub source_account: Pubkey,
    /// Account the bridge instruction is addressed to.
    pub recipient_placeholder: Pubkey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestinationAmount {
    Auto,
    Fixed(u128),
}

impl DestinationAmount {
    pub fn as_query_value(&self) -> String {
        match self {
            DestinationAmount::Auto => "auto".to_string(),
            DestinationAmount::Fixed(amount) => amount.to_string(),
        }
    }
}

/// Contract call the bridge performs on the destination chain after delivery.
#[derive(Clone, Debug, PartialEq)]
pub struct DestinationCall {
    pub to: Address,
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CrossChainOrderRequest {
    pub source_chain_id: u64,
    pub destination_chain_id: u64,
    pub source_token: String,
    /// Lamports.
    pub source_amount: u64,
    pub source_authority: Pubkey,
    pub destination_token: Address,
    pub destination_amount: DestinationAmount,
    pub destination_recipient: Address,
    pub destination_authority: Address,
    pub destination_call: Option<DestinationCall>,
}

/// Transaction data returned by the bridge for the caller to submit.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionStub {
    pub to: Option<String>,
    pub data: Bytes,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CrossChainOrderResult {
    pub order_id: String,
    pub fee_estimate: String,
    pub tx: TransactionStub,
}

/// Unsigned source-chain transaction parts. Never signed or sent by this service.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceChainSubmission {
    pub fee_payer: Pubkey,
    pub recent_blockhash: Hash,
    pub instructions: Vec<Instruction>,
    /// Informational only.
    pub estimated_fee_lamports: Option<u64>,
}

// ---------- action payloads ----------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptionSpec {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub label: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinkedAction {
    pub href: String,
    pub label: String,
    pub parameters: Vec<FieldSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionLinks {
    pub actions: Vec<LinkedAction>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Offer {
    pub title: String,
    pub description: String,
    pub label: String,
    pub icon: String,
    pub disabled: bool,
    pub links: ActionLinks,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderResponse {
    /// base64 bincode of the unsigned transaction.
    pub transaction: String,
    pub message: String,
    /// Source-chain network fee for `transaction`, when the RPC could estimate it.
    #[serde(rename = "networkFeeLamports", skip_serializing_if = "Option::is_none")]
    pub network_fee_lamports: Option<u64>,
}
