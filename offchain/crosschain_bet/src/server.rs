// offchain/crosschain_bet/src/server.rs
use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
        },
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{info, warn};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::bridge::OrderService;
use crate::card::IconRenderer;
use crate::config::{ActionHeaders, Config};
use crate::error::{BetError, BetResult};
use crate::input::{resolve_query, ActionQuery, OrderBody};
use crate::ledger::SourceLedger;
use crate::market::MarketData;
use crate::offer::build_offer;
use crate::order::OrderConstructor;
use crate::types::{Offer, OrderResponse};

pub const ACTION_PATH: &str = "/api/actions/crosschain-bet";

const X_ACTION_VERSION: HeaderName = HeaderName::from_static("x-action-version");
const X_BLOCKCHAIN_IDS: HeaderName = HeaderName::from_static("x-blockchain-ids");

/// Upstream collaborators, each behind its own seam.
#[derive(Clone)]
pub struct Upstreams {
    pub market: Arc<dyn MarketData>,
    pub bridge: Arc<dyn OrderService>,
    pub ledger: Arc<dyn SourceLedger>,
    pub icons: Arc<dyn IconRenderer>,
}

pub struct ActionServer {
    cfg: Arc<Config>,
    upstreams: Upstreams,
    // stamped on every response
    headers: HeaderMap,
}

impl ActionServer {
    pub fn new(cfg: Arc<Config>, upstreams: Upstreams) -> Result<Self> {
        let headers = action_header_map(&cfg.headers)?;
        Ok(Self {
            cfg,
            upstreams,
            headers,
        })
    }

    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route(ACTION_PATH, get(get_offer).post(post_order).options(preflight))
            .with_state(self)
    }

    pub async fn run(self: Arc<Self>) -> Result<()> {
        let listener = TcpListener::bind(self.cfg.listen_addr).await?;
        info!("[server] listening on http://{}{ACTION_PATH}", self.cfg.listen_addr);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    pub async fn offer(&self, query: &ActionQuery) -> BetResult<Offer> {
        let resolved = resolve_query(query, &self.cfg.defaults)?;
        build_offer(
            self.upstreams.market.as_ref(),
            self.upstreams.icons.as_ref(),
            &self.cfg.public_base_url,
            &resolved,
        )
        .await
    }

    pub async fn order(&self, query: &ActionQuery, raw_body: &[u8]) -> BetResult<OrderResponse> {
        let body: OrderBody = serde_json::from_slice(raw_body)
            .map_err(|e| BetError::invalid(format!("request body is not a valid order: {e}")))?;
        let constructor = OrderConstructor {
            market: self.upstreams.market.as_ref(),
            bridge: self.upstreams.bridge.as_ref(),
            ledger: self.upstreams.ledger.as_ref(),
            settings: &self.cfg.order,
        };
        constructor
            .construct_from_request(query, &body, &self.cfg.defaults)
            .await?
            .to_response()
    }

    fn respond<T: Serialize>(&self, result: BetResult<T>) -> Response {
        let mut resp = match result {
            Ok(payload) => Json(payload).into_response(),
            Err(e) => {
                warn!("[server] request failed: {e}");
                (
                    StatusCode::BAD_REQUEST,
                    [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                    e.to_string(),
                )
                    .into_response()
            }
        };
        resp.headers_mut().extend(self.headers.clone());
        resp
    }
}

async fn get_offer(
    State(server): State<Arc<ActionServer>>,
    query: Result<Query<ActionQuery>, QueryRejection>,
) -> Response {
    let result = match query {
        Ok(Query(q)) => server.offer(&q).await,
        Err(e) => Err(BetError::invalid(e.body_text())),
    };
    server.respond(result)
}

async fn post_order(
    State(server): State<Arc<ActionServer>>,
    query: Result<Query<ActionQuery>, QueryRejection>,
    body: Bytes,
) -> Response {
    let result = match query {
        Ok(Query(q)) => server.order(&q, &body).await,
        Err(e) => Err(BetError::invalid(e.body_text())),
    };
    server.respond(result)
}

async fn preflight(State(server): State<Arc<ActionServer>>) -> Response {
    let mut resp = StatusCode::OK.into_response();
    resp.headers_mut().extend(server.headers.clone());
    resp
}

pub fn action_header_map(headers: &ActionHeaders) -> Result<HeaderMap> {
    let value = |v: &str| {
        HeaderValue::from_str(v).map_err(|_| anyhow!("invalid header value '{v}'"))
    };
    let mut map = HeaderMap::new();
    map.insert(ACCESS_CONTROL_ALLOW_ORIGIN, value(&headers.allowed_origin)?);
    map.insert(ACCESS_CONTROL_ALLOW_METHODS, value(&headers.allow_methods)?);
    map.insert(ACCESS_CONTROL_ALLOW_HEADERS, value(&headers.allow_headers)?);
    map.insert(X_ACTION_VERSION, value(&headers.action_version)?);
    map.insert(X_BLOCKCHAIN_IDS, value(&headers.blockchain_ids)?);
    Ok(map)
}
