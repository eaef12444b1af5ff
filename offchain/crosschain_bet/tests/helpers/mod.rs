#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde_json::json;
use solana_sdk::{hash::Hash, message::Message, pubkey::Pubkey};

use crosschain_bet::{
    bridge::{CreateTxResponse, OrderService},
    card::IconRenderer,
    config::Config,
    ledger::SourceLedger,
    market::MarketData,
    server::{ActionServer, Upstreams},
    types::{
        CrossChainOrderRequest, MarketReference, MarketSnapshot, MarketStatus, Offer, OptionSpec,
        Outcome, Participant,
    },
    BetError, BetResult,
};

pub const MARKET_ID: &str = "1001000000001595771060";
pub const CONDITION_ID: &str = "100110010000000015957710600000000000000386328164";
pub const WALLET: &str = "0x1111111111111111111111111111111111111111";
pub const LP: &str = "0x7043E4e1c4045424858ECBCED80989FeAfC11B36";
pub const CORE: &str = "0xA40F8D69D412b79b49EAbdD5cf1b5706395bfCf7";
pub const USDT: &str = "0xc2132d05d31c914a87c6611c10748aeb04b58e8f";
pub const RECOMMENDED_AMOUNT: u128 = 150_123_456;
pub const ORDER_ID: &str = "0x6b1f2a";
pub const FIX_FEE: &str = "15000000";
pub const BRIDGE_TX_DATA: [u8; 4] = [0xde, 0xb1, 0xd6, 0xe0];

pub fn test_config() -> Config {
    let env = HashMap::from([
        ("LP_ADDRESS", LP),
        ("CORE_ADDRESS", CORE),
        ("DESTINATION_TOKEN", USDT),
        ("SOLANA_RPC", "http://127.0.0.1:8899"),
        ("PUBLIC_BASE_URL", "https://bets.example"),
    ]);
    Config::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap()
}

/// The two-team snapshot used across scenarios: A at 1.80, B at 2.10.
pub fn open_snapshot() -> MarketSnapshot {
    MarketSnapshot {
        status: MarketStatus::Created,
        title: Some("A - B".into()),
        sport: "Football".into(),
        league: "Ekstraklasa".into(),
        starts_at: 1_700_000_000,
        participants: vec![
            Participant { name: "A".into(), image: None, sort_order: 0 },
            Participant { name: "B".into(), image: None, sort_order: 1 },
        ],
        condition_id: Some(CONDITION_ID.into()),
        outcomes: vec![
            Outcome { outcome_id: 7, current_odds: dec!(1.80), sort_order: 0 },
            Outcome { outcome_id: 8, current_odds: dec!(2.10), sort_order: 1 },
        ],
    }
}

/// Options of the `betOption` field, empty for a disabled offer.
pub fn offer_outcomes(offer: &Offer) -> &[OptionSpec] {
    offer
        .links
        .actions
        .first()
        .and_then(|a| a.parameters.first())
        .map(|p| p.options.as_slice())
        .unwrap_or(&[])
}

// ---------- market ----------

pub struct FakeMarket {
    pub response: BetResult<Option<MarketSnapshot>>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<MarketReference>>,
}

impl FakeMarket {
    pub fn new(response: BetResult<Option<MarketSnapshot>>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn open() -> Self {
        Self::new(Ok(Some(open_snapshot())))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    async fn fetch_snapshot(&self, reference: &MarketReference) -> BetResult<Option<MarketSnapshot>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(reference.clone());
        self.response.clone()
    }
}

// ---------- bridge ----------

pub struct FakeBridge {
    pub responses: Mutex<VecDeque<BetResult<CreateTxResponse>>>,
    pub requests: Mutex<Vec<CrossChainOrderRequest>>,
}

impl FakeBridge {
    pub fn new(responses: Vec<BetResult<CreateTxResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Quote then final order, both successful.
    pub fn healthy() -> Self {
        Self::new(vec![Ok(quote()), Ok(final_order())])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, i: usize) -> CrossChainOrderRequest {
        self.requests.lock().unwrap()[i].clone()
    }
}

pub fn quote() -> CreateTxResponse {
    serde_json::from_value(json!({
        "estimation": {
            "dstChainTokenOut": {
                "amount": "151000000",
                "recommendedAmount": format!("{RECOMMENDED_AMOUNT}.75")
            }
        },
        "tx": {"data": "0x00"},
        "fixFee": FIX_FEE
    }))
    .unwrap()
}

pub fn final_order() -> CreateTxResponse {
    serde_json::from_value(json!({
        "orderId": ORDER_ID,
        "estimation": {"dstChainTokenOut": {"recommendedAmount": RECOMMENDED_AMOUNT.to_string()}},
        "tx": {"data": format!("0x{}", BRIDGE_TX_DATA.iter().map(|b| format!("{b:02x}")).collect::<String>())},
        "fixFee": FIX_FEE
    }))
    .unwrap()
}

pub fn server_error() -> BetError {
    BetError::bridge("create-tx returned 500 Internal Server Error: upstream exploded")
}

#[async_trait]
impl OrderService for FakeBridge {
    async fn create_tx(&self, request: &CrossChainOrderRequest) -> BetResult<CreateTxResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BetError::bridge("no canned response left")))
    }
}

// ---------- ledger ----------

pub struct FakeLedger {
    pub rent_minimum: u64,
    pub blockhash: Hash,
    pub fee: BetResult<u64>,
    pub rent_calls: AtomicUsize,
    pub blockhash_calls: AtomicUsize,
    pub fee_calls: AtomicUsize,
}

impl FakeLedger {
    pub fn new(rent_minimum: u64) -> Self {
        Self {
            rent_minimum,
            blockhash: Hash::new_unique(),
            fee: Ok(5000),
            rent_calls: AtomicUsize::new(0),
            blockhash_calls: AtomicUsize::new(0),
            fee_calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.rent_calls.load(Ordering::SeqCst)
            + self.blockhash_calls.load(Ordering::SeqCst)
            + self.fee_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceLedger for FakeLedger {
    async fn minimum_balance_for_rent_exemption(&self, data_len: usize) -> BetResult<u64> {
        assert_eq!(data_len, 0);
        self.rent_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.rent_minimum)
    }

    async fn latest_blockhash(&self) -> BetResult<Hash> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.blockhash)
    }

    async fn fee_for_message(&self, _message: &Message) -> BetResult<u64> {
        self.fee_calls.fetch_add(1, Ordering::SeqCst);
        self.fee.clone()
    }
}

// ---------- icons ----------

pub struct StubIcons(pub Option<String>);

#[async_trait]
impl IconRenderer for StubIcons {
    async fn render(&self, _snapshot: &MarketSnapshot) -> Option<String> {
        self.0.clone()
    }
}

pub fn stub_icon() -> StubIcons {
    StubIcons(Some("data:image/png;base64,AAAA".to_string()))
}

// ---------- wiring ----------

pub struct Harness {
    pub market: Arc<FakeMarket>,
    pub bridge: Arc<FakeBridge>,
    pub ledger: Arc<FakeLedger>,
    pub server: Arc<ActionServer>,
}

pub fn harness(market: FakeMarket, bridge: FakeBridge, ledger: FakeLedger) -> Harness {
    let market = Arc::new(market);
    let bridge = Arc::new(bridge);
    let ledger = Arc::new(ledger);
    let upstreams = Upstreams {
        market: market.clone(),
        bridge: bridge.clone(),
        ledger: ledger.clone(),
        icons: Arc::new(stub_icon()),
    };
    let server = Arc::new(ActionServer::new(Arc::new(test_config()), upstreams).unwrap());
    Harness {
        market,
        bridge,
        ledger,
        server,
    }
}

pub fn order_body(account: &str, bet_option: &str, amount: &str) -> serde_json::Value {
    json!({
        "account": account,
        "data": {"betOption": bet_option, "walletAddress": WALLET, "amount": amount}
    })
}

pub fn new_account() -> Pubkey {
    Pubkey::new_unique()
}
