// offchain/crosschain_bet/src/bridge.rs
use alloy_primitives::{hex, Bytes};
use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{BetError, BetResult};
use crate::protocol::external_call_envelope;
use crate::types::{
    CrossChainOrderRequest, CrossChainOrderResult, DestinationAmount, Scalar, TransactionStub,
};

/// Cross-chain order service. One call, one `create-tx` round trip, no retries.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_tx(&self, request: &CrossChainOrderRequest) -> BetResult<CreateTxResponse>;
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTxResponse {
    pub order_id: Option<String>,
    pub estimation: Option<Estimation>,
    pub tx: Option<RawTx>,
    pub fix_fee: Option<Scalar>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimation {
    pub dst_chain_token_out: Option<TokenOut>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenOut {
    pub recommended_amount: Option<Scalar>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawTx {
    pub to: Option<String>,
    pub data: Option<String>,
}

/// DLN REST client.
pub struct DlnClient {
    http: reqwest::Client,
    base_url: String,
}

impl DlnClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OrderService for DlnClient {
    async fn create_tx(&self, request: &CrossChainOrderRequest) -> BetResult<CreateTxResponse> {
        let url = format!("{}/dln/order/create-tx", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&create_tx_params(request))
            .send()
            .await
            .map_err(|e| BetError::bridge(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(BetError::bridge(format!("create-tx returned {status}: {snippet}")));
        }

        resp.json::<CreateTxResponse>()
            .await
            .map_err(|e| BetError::bridge(format!("malformed create-tx response: {e}")))
    }
}

/// Query string for `create-tx`. The external call is only attached once the
/// destination amount is fixed.
pub fn create_tx_params(request: &CrossChainOrderRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("srcChainId", request.source_chain_id.to_string()),
        ("srcChainTokenIn", request.source_token.clone()),
        ("srcChainTokenInAmount", request.source_amount.to_string()),
        ("srcChainOrderAuthorityAddress", request.source_authority.to_string()),
        ("dstChainId", request.destination_chain_id.to_string()),
        ("dstChainTokenOut", request.destination_token.to_string()),
        ("dstChainTokenOutAmount", request.destination_amount.as_query_value()),
        ("dstChainTokenOutRecipient", request.destination_recipient.to_string()),
        ("dstChainOrderAuthorityAddress", request.destination_authority.to_string()),
        ("prependOperatingExpenses", "false".to_string()),
    ];
    if let Some(call) = &request.destination_call {
        params.push(("externalCall", external_call_envelope(call.to, &call.data)));
    }
    params
}

/// Step one: ask for an `auto` quote and pin the destination amount it recommends.
pub async fn estimate_destination_amount(
    service: &dyn OrderService,
    request: &CrossChainOrderRequest,
) -> BetResult<u128> {
    let mut quote_request = request.clone();
    quote_request.destination_amount = DestinationAmount::Auto;
    quote_request.destination_call = None;

    let quote = service.create_tx(&quote_request).await?;
    let token_out = quote
        .estimation
        .and_then(|e| e.dst_chain_token_out)
        .ok_or_else(|| BetError::bridge("quote carried no destination estimation"))?;
    let recommended = token_out
        .recommended_amount
        .ok_or_else(|| BetError::bridge("quote carried no recommended amount"))?;

    let amount = floor_amount(&recommended)?;
    if amount == 0 {
        return Err(BetError::bridge("stake is too small to cover bridge fees"));
    }
    debug!("[bridge] recommended destination amount {amount}");
    Ok(amount)
}

/// Step two: request the final order with a fixed amount and the call attached.
pub async fn create_final_order(
    service: &dyn OrderService,
    request: &CrossChainOrderRequest,
) -> BetResult<CrossChainOrderResult> {
    if request.destination_amount == DestinationAmount::Auto {
        return Err(BetError::invalid(
            "destination amount must be fixed before the final order",
        ));
    }

    let resp = service.create_tx(request).await?;
    let order_id = resp
        .order_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| BetError::bridge("order carried no orderId"))?;
    let fee_estimate = resp
        .fix_fee
        .map(|f| f.as_text())
        .ok_or_else(|| BetError::bridge("order carried no fixFee"))?;
    let tx = resp
        .tx
        .ok_or_else(|| BetError::bridge("order carried no transaction"))?;
    let raw_data = tx
        .data
        .ok_or_else(|| BetError::bridge("order transaction carried no data"))?;
    let data: Bytes = hex::decode(raw_data.trim())
        .map_err(|e| BetError::bridge(format!("order transaction data is not hex: {e}")))?
        .into();
    if data.is_empty() {
        return Err(BetError::bridge("order transaction data is empty"));
    }

    info!(
        "[bridge] order {order_id} created (fixFee {fee_estimate}, tx to {})",
        tx.to.as_deref().unwrap_or("unset")
    );
    Ok(CrossChainOrderResult {
        order_id,
        fee_estimate,
        tx: TransactionStub { to: tx.to, data },
    })
}

fn floor_amount(value: &Scalar) -> BetResult<u128> {
    let text = value.as_text();
    text.parse::<Decimal>()
        .ok()
        .filter(|d| !d.is_sign_negative())
        .and_then(|d| d.floor().to_u128())
        .ok_or_else(|| BetError::bridge(format!("recommended amount '{text}' is not a number")))
}
