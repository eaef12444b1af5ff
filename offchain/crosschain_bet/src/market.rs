// offchain/crosschain_bet/src/market.rs
use std::str::FromStr;

use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::error::{BetError, BetResult};
use crate::types::{MarketReference, MarketSnapshot, MarketStatus, Outcome, Participant, Scalar};

const GAME_QUERY: &str = r#"
query Game($gameId: String!, $conditionId: String!) {
  games(where: {gameId: $gameId}) {
    gameId
    league { name }
    sport { name }
    startsAt
    title
    status
    conditions(where: {conditionId: $conditionId}) {
      conditionId
      outcomes {
        currentOdds
        outcomeId
        sortOrder
      }
    }
    participants {
      image
      name
      sortOrder
    }
  }
}
"#;

/// Source of live game/condition state.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// `Ok(None)` when the provider knows no such game.
    async fn fetch_snapshot(&self, reference: &MarketReference) -> BetResult<Option<MarketSnapshot>>;
}

/// Sportsbook subgraph client.
pub struct GraphQlMarketClient {
    http: reqwest::Client,
    url: String,
}

impl GraphQlMarketClient {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl MarketData for GraphQlMarketClient {
    async fn fetch_snapshot(&self, reference: &MarketReference) -> BetResult<Option<MarketSnapshot>> {
        let body = json!({
            "query": GAME_QUERY,
            "variables": {
                "gameId": reference.market_id,
                "conditionId": reference.condition_id,
            }
        });

        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BetError::upstream(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BetError::upstream(format!("API call failed with status {status}")));
        }

        let payload: GraphQlResponse = resp
            .json()
            .await
            .map_err(|e| BetError::upstream(format!("malformed response: {e}")))?;

        debug!("[market] game {} fetched", reference.market_id);
        snapshot_from_response(payload, reference)
    }
}

// ---------- wire format ----------

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    data: Option<GamesData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GamesData {
    games: Vec<RawGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGame {
    title: Option<String>,
    status: String,
    starts_at: Scalar,
    sport: Named,
    league: Named,
    #[serde(default)]
    conditions: Vec<RawCondition>,
    #[serde(default)]
    participants: Vec<RawParticipant>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCondition {
    condition_id: String,
    #[serde(default)]
    outcomes: Vec<RawOutcome>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOutcome {
    current_odds: Scalar,
    outcome_id: Scalar,
    sort_order: Scalar,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParticipant {
    name: String,
    image: Option<String>,
    sort_order: Scalar,
}

fn parse_scalar<T: FromStr>(value: &Scalar, field: &str) -> BetResult<T> {
    let text = value.as_text();
    text.parse()
        .map_err(|_| BetError::upstream(format!("malformed {field} '{text}'")))
}

/// Validates a subgraph payload into a snapshot for `reference`.
pub fn snapshot_from_response(
    payload: GraphQlResponse,
    reference: &MarketReference,
) -> BetResult<Option<MarketSnapshot>> {
    if let Some(err) = payload.errors.first() {
        return Err(BetError::upstream(err.message.clone()));
    }
    let data = payload
        .data
        .ok_or_else(|| BetError::upstream("response carried no data"))?;
    let Some(game) = data.games.into_iter().next() else {
        return Ok(None);
    };

    let participants = game
        .participants
        .iter()
        .map(|p| {
            Ok(Participant {
                name: p.name.clone(),
                image: p.image.clone().filter(|i| !i.is_empty()),
                sort_order: parse_scalar(&p.sort_order, "participant sortOrder")?,
            })
        })
        .collect::<BetResult<Vec<_>>>()?;

    let condition = game
        .conditions
        .into_iter()
        .find(|c| c.condition_id == reference.condition_id);

    let (condition_id, outcomes) = match condition {
        Some(c) => {
            let outcomes = c
                .outcomes
                .iter()
                .map(|o| {
                    Ok(Outcome {
                        outcome_id: parse_scalar(&o.outcome_id, "outcomeId")?,
                        current_odds: parse_scalar::<Decimal>(&o.current_odds, "currentOdds")?,
                        sort_order: parse_scalar(&o.sort_order, "outcome sortOrder")?,
                    })
                })
                .collect::<BetResult<Vec<_>>>()?;
            (Some(c.condition_id), outcomes)
        }
        None => (None, Vec::new()),
    };

    Ok(Some(MarketSnapshot {
        status: MarketStatus::from_feed(&game.status),
        title: game.title,
        sport: game.sport.name,
        league: game.league.name,
        starts_at: parse_scalar(&game.starts_at, "startsAt")?,
        participants,
        condition_id,
        outcomes,
    }))
}
