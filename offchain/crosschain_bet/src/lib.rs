//! Cross-chain sportsbook bets paid from Solana.
//!
//! Two stateless pipelines back a single action endpoint:
//! - [`offer`] reads a live market and describes the bet a user can place;
//! - [`order`] turns the user's choice into a cross-chain order whose
//!   destination leg calls the sportsbook, and returns an unsigned Solana
//!   transaction for the wallet to sign.

pub mod bridge;
pub mod card;
pub mod config;
pub mod error;
pub mod input;
pub mod ledger;
pub mod market;
pub mod odds;
pub mod offer;
pub mod order;
pub mod protocol;
pub mod server;
pub mod types;

pub use error::{BetError, BetResult};
