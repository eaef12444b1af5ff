// offchain/crosschain_bet/src/order.rs
use futures::future::try_join;
use log::{info, warn};
use rust_decimal::Decimal;

use crate::bridge::{create_final_order, estimate_destination_amount, OrderService};
use crate::config::{OrderSettings, RequestDefaults};
use crate::error::{BetError, BetResult};
use crate::input::{parse_bet_intent, ActionQuery, OrderBody};
use crate::ledger::{bridge_instruction, encode_transaction, unsigned_message, unsigned_transaction, SourceLedger};
use crate::market::MarketData;
use crate::odds::{min_acceptable_odds, MinOddsGuard};
use crate::protocol::{encode_bet_for, parse_condition_id, BetForArgs};
use crate::types::{
    BetIntent, CrossChainOrderRequest, CrossChainOrderResult, DestinationAmount, DestinationCall,
    OrderResponse, SourceChainSubmission,
};

/// Rent-exemption is checked for an account with no data.
const RENT_CHECK_DATA_LEN: usize = 0;

/// Everything produced for one bet. Only `submission` and `confirmation` go
/// back to the client; the rest is kept for logging and tests.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructedOrder {
    pub guard: MinOddsGuard,
    pub destination_amount: u128,
    pub deadline: u64,
    pub order: CrossChainOrderResult,
    pub submission: SourceChainSubmission,
    pub confirmation: String,
}

impl ConstructedOrder {
    pub fn to_response(&self) -> BetResult<OrderResponse> {
        Ok(OrderResponse {
            transaction: encode_transaction(&unsigned_transaction(&self.submission))?,
            message: self.confirmation.clone(),
            network_fee_lamports: self.submission.estimated_fee_lamports,
        })
    }
}

pub struct OrderConstructor<'a> {
    pub market: &'a dyn MarketData,
    pub bridge: &'a dyn OrderService,
    pub ledger: &'a dyn SourceLedger,
    pub settings: &'a OrderSettings,
}

impl<'a> OrderConstructor<'a> {
    /// Validates the raw request, then builds the order. Malformed input is
    /// rejected before any upstream is contacted.
    pub async fn construct_from_request(
        &self,
        query: &ActionQuery,
        body: &OrderBody,
        defaults: &RequestDefaults,
    ) -> BetResult<ConstructedOrder> {
        let intent = parse_bet_intent(query, body, defaults, self.settings.slippage_bps)?;
        self.construct(&intent).await
    }

    pub async fn construct(&self, intent: &BetIntent) -> BetResult<ConstructedOrder> {
        self.construct_at(intent, chrono::Utc::now().timestamp()).await
    }

    /// Linear pipeline; any failure ends the request, nothing is retried.
    pub async fn construct_at(&self, intent: &BetIntent, now: i64) -> BetResult<ConstructedOrder> {
        let settings = self.settings;
        let guard = min_acceptable_odds(intent.odds_at_selection, intent.slippage_bps)?;
        let condition_id = parse_condition_id(&intent.market.condition_id)?;
        let deadline = u64::try_from(now)
            .ok()
            .and_then(|n| n.checked_add(settings.deadline_secs))
            .ok_or_else(|| BetError::invalid("request time is out of range"))?;

        self.check_live_odds(intent, &guard).await?;

        let mut request = CrossChainOrderRequest {
            source_chain_id: settings.source_chain_id,
            destination_chain_id: settings.destination_chain_id,
            source_token: spl_token::native_mint::id().to_string(),
            source_amount: intent.stake_lamports,
            source_authority: intent.source_account,
            destination_token: settings.destination_token,
            destination_amount: DestinationAmount::Auto,
            destination_recipient: intent.destination_wallet,
            destination_authority: intent.destination_wallet,
            destination_call: None,
        };

        let destination_amount = estimate_destination_amount(self.bridge, &request).await?;

        let call_data = encode_bet_for(&BetForArgs {
            bettor: intent.destination_wallet,
            core: settings.core_address,
            amount: destination_amount,
            expires_at: deadline,
            affiliate: settings.affiliate,
            min_odds: guard.raw,
            condition_id,
            outcome_id: intent.outcome_id,
        });
        request.destination_amount = DestinationAmount::Fixed(destination_amount);
        request.destination_call = Some(DestinationCall {
            to: settings.lp_address,
            data: call_data,
        });

        let order = create_final_order(self.bridge, &request).await?;

        let (minimum_lamports, recent_blockhash) = try_join(
            self.ledger.minimum_balance_for_rent_exemption(RENT_CHECK_DATA_LEN),
            self.ledger.latest_blockhash(),
        )
        .await?;
        if intent.stake_lamports < minimum_lamports {
            return Err(BetError::InsufficientFunds {
                stake_lamports: intent.stake_lamports,
                minimum_lamports,
            });
        }

        let instructions = vec![bridge_instruction(
            settings.bridge_program_id,
            intent.recipient_placeholder,
            &order.tx.data,
        )];
        let message = unsigned_message(&intent.source_account, &instructions, &recent_blockhash);
        let estimated_fee_lamports = match self.ledger.fee_for_message(&message).await {
            Ok(fee) => Some(fee),
            Err(e) => {
                warn!("[order] fee estimate unavailable: {e}");
                None
            }
        };

        let network_fee = estimated_fee_lamports
            .map(|fee| format!("{fee} lamports"))
            .unwrap_or_else(|| "unknown".to_string());
        info!(
            "[order] {} -> {}: outcome {} stake {} lamports, min odds {}, order {}, network fee {}",
            intent.source_account,
            intent.destination_wallet,
            intent.outcome_id,
            intent.stake_lamports,
            guard.min_acceptable,
            order.order_id,
            network_fee
        );

        let confirmation = format!(
            "Bet placed successfully with a fee of {} & orderId {}",
            order.fee_estimate, order.order_id
        );
        Ok(ConstructedOrder {
            guard,
            destination_amount,
            deadline,
            submission: SourceChainSubmission {
                fee_payer: intent.source_account,
                recent_blockhash,
                instructions,
                estimated_fee_lamports,
            },
            order,
            confirmation,
        })
    }

    /// Re-reads the market instead of trusting the odds the client echoes back.
    async fn check_live_odds(&self, intent: &BetIntent, guard: &MinOddsGuard) -> BetResult<()> {
        let market_id = &intent.market.market_id;
        let snapshot = self
            .market
            .fetch_snapshot(&intent.market)
            .await?
            .ok_or_else(|| BetError::invalid(format!("unknown market {market_id}")))?;

        if !snapshot.is_open() {
            return Err(BetError::MarketClosed(format!(
                "market {market_id} is {:?}",
                snapshot.status
            )));
        }
        let live: Decimal = snapshot
            .outcome(intent.outcome_id)
            .map(|o| o.current_odds)
            .ok_or_else(|| {
                BetError::invalid(format!(
                    "outcome {} is not part of condition {}",
                    intent.outcome_id, intent.market.condition_id
                ))
            })?;
        if live < guard.min_acceptable {
            return Err(BetError::StaleOdds {
                live: live.to_string(),
                min_acceptable: guard.min_acceptable.to_string(),
            });
        }
        Ok(())
    }
}
