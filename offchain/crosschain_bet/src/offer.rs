// offchain/crosschain_bet/src/offer.rs
use std::collections::HashMap;

use chrono::DateTime;
use log::{info, warn};

use crate::card::{IconRenderer, FALLBACK_ICON_URL};
use crate::error::{BetError, BetResult};
use crate::input::{ResolvedQuery, AMOUNT_PATTERN, BET_OPTION_SEPARATOR, EVM_ADDRESS_PATTERN};
use crate::market::MarketData;
use crate::server::ACTION_PATH;
use crate::types::{ActionLinks, FieldSpec, LinkedAction, MarketSnapshot, Offer, OptionSpec};

pub const OFFER_LABEL: &str = "Bet on your favorite team via SOL now!";
pub const OPEN_ACTION_LABEL: &str = "Place Bet";
pub const CLOSED_ACTION_LABEL: &str = "Market Closed";
pub const DRAW_LABEL: &str = "Draw";
const MARKET_NAME: &str = "Full Time Result";

/// Fetches the market fresh and turns it into an action offer.
///
/// Only a provider failure or an unknown game is an error. A market that is
/// not open still yields an offer, just a disabled one without input fields.
pub async fn build_offer(
    market: &dyn MarketData,
    icons: &dyn IconRenderer,
    public_base_url: &str,
    query: &ResolvedQuery,
) -> BetResult<Offer> {
    let snapshot = market
        .fetch_snapshot(&query.market)
        .await?
        .ok_or_else(|| BetError::invalid(format!("unknown market {}", query.market.market_id)))?;

    let open = snapshot.is_open();
    if !open {
        info!(
            "[offer] market {} not open ({:?}, {} outcomes)",
            query.market.market_id,
            snapshot.status,
            snapshot.outcomes.len()
        );
    }

    let href = format!(
        "{public_base_url}{ACTION_PATH}?to={}&amount={{amount}}&marketId={}&conditionId={}",
        query.to, query.market.market_id, query.market.condition_id
    );
    let parameters = if open {
        required_fields(outcome_options(&snapshot))
    } else {
        Vec::new()
    };

    let icon = icons
        .render(&snapshot)
        .await
        .unwrap_or_else(|| FALLBACK_ICON_URL.to_string());

    Ok(Offer {
        title: title(&snapshot),
        description: description(&snapshot),
        label: OFFER_LABEL.to_string(),
        icon,
        disabled: !open,
        links: ActionLinks {
            actions: vec![LinkedAction {
                href,
                label: (if open { OPEN_ACTION_LABEL } else { CLOSED_ACTION_LABEL }).to_string(),
                parameters,
            }],
        },
    })
}

/// One option per outcome, labelled with the participant sharing its `sortOrder`.
///
/// The feed offers no real key between outcomes and participants, so this
/// positional match is trusted as-is; an outcome with no match is the draw.
pub fn outcome_options(snapshot: &MarketSnapshot) -> Vec<OptionSpec> {
    let mut by_order: HashMap<i64, &str> = HashMap::new();
    for p in &snapshot.participants {
        if by_order.insert(p.sort_order, p.name.as_str()).is_some() {
            warn!("[offer] duplicate participant sortOrder {}", p.sort_order);
        }
    }

    snapshot
        .outcomes
        .iter()
        .map(|o| {
            let name = by_order.get(&o.sort_order).copied().unwrap_or(DRAW_LABEL);
            OptionSpec {
                label: format!("{name} (Odds: {})", o.current_odds),
                value: format!("{}{BET_OPTION_SEPARATOR}{}", o.outcome_id, o.current_odds),
            }
        })
        .collect()
}

pub fn required_fields(options: Vec<OptionSpec>) -> Vec<FieldSpec> {
    vec![
        FieldSpec {
            kind: "radio".to_string(),
            name: "betOption".to_string(),
            label: MARKET_NAME.to_string(),
            required: true,
            pattern: None,
            options,
        },
        FieldSpec {
            kind: "text".to_string(),
            name: "walletAddress".to_string(),
            label: "Your Polygon wallet address".to_string(),
            required: true,
            pattern: Some(EVM_ADDRESS_PATTERN.to_string()),
            options: Vec::new(),
        },
        FieldSpec {
            kind: "text".to_string(),
            name: "amount".to_string(),
            label: "Enter bet amount (SOL)".to_string(),
            required: true,
            pattern: Some(AMOUNT_PATTERN.to_string()),
            options: Vec::new(),
        },
    ]
}

fn title(snapshot: &MarketSnapshot) -> String {
    match (snapshot.home(), snapshot.away()) {
        (Some(home), Some(away)) => format!("{} vs {}", home.name, away.name),
        _ => snapshot.title.clone().unwrap_or_else(|| "Upcoming match".to_string()),
    }
}

fn description(snapshot: &MarketSnapshot) -> String {
    let kickoff = DateTime::from_timestamp(snapshot.starts_at, 0)
        .map(|t| t.format("%b %-d, %Y, %-I:%M %p").to_string())
        .unwrap_or_else(|| "TBD".to_string());
    format!(
        "{} > {}\n{kickoff} UTC\n\n{OFFER_LABEL}\n\n\
         Specify your non-CEX Polygon wallet address below, correctly. \
         Redeem winnings at sportsbooks.dgbet.fun/bets after the game ends.",
        snapshot.sport, snapshot.league
    )
}
