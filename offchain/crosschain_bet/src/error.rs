// offchain/crosschain_bet/src/error.rs
use std::fmt;

/// Every way a single offer or order request can fail.
///
/// All variants are terminal for the request that produced them and are
/// surfaced to the caller as HTTP 400 with the `Display` text as body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BetError {
    /// Malformed address, non-positive amount, bad market reference or bet option
    InvalidInput(String),
    /// Market-data provider unreachable, non-2xx or returned a malformed body
    UpstreamUnavailable(String),
    /// Bridge order service unreachable, non-2xx or returned a malformed body
    BridgeUnavailable(String),
    /// Source-chain RPC failed while checking viability or fetching a blockhash
    Ledger(String),
    /// Stake is below the source chain's rent-exemption minimum
    InsufficientFunds { stake_lamports: u64, minimum_lamports: u64 },
    /// Market status is not open for betting, or the condition is gone
    MarketClosed(String),
    /// Live odds already sit below the slippage guard the user accepted
    StaleOdds { live: String, min_acceptable: String },
    /// Required process configuration is missing or malformed
    Configuration(String),
}

impl fmt::Display for BetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetError::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            BetError::UpstreamUnavailable(msg) => {
                write!(f, "Market data unavailable: {msg}")
            }
            BetError::BridgeUnavailable(msg) => {
                write!(f, "Cross-chain order service unavailable: {msg}")
            }
            BetError::Ledger(msg) => write!(f, "Solana RPC error: {msg}"),
            BetError::InsufficientFunds {
                stake_lamports,
                minimum_lamports,
            } => write!(
                f,
                "Account may not be rent exempt: stake of {stake_lamports} lamports is below the minimum of {minimum_lamports}"
            ),
            BetError::MarketClosed(msg) => write!(f, "Market Closed: {msg}"),
            BetError::StaleOdds {
                live,
                min_acceptable,
            } => write!(
                f,
                "Odds moved to {live}, below your minimum acceptable odds of {min_acceptable}; refresh and try again"
            ),
            BetError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for BetError {}

pub type BetResult<T> = Result<T, BetError>;

impl BetError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        BetError::InvalidInput(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        BetError::UpstreamUnavailable(msg.into())
    }

    pub fn bridge(msg: impl Into<String>) -> Self {
        BetError::BridgeUnavailable(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        BetError::Configuration(msg.into())
    }
}

impl From<solana_client::client_error::ClientError> for BetError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        BetError::Ledger(err.to_string())
    }
}
