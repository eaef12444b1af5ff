use std::{sync::Arc, time::Duration};

use anyhow::Result;
use dotenvy::dotenv;
use log::info;

use crosschain_bet::{
    bridge::DlnClient,
    card::CardRenderer,
    config::Config,
    ledger::RpcLedger,
    market::GraphQlMarketClient,
    server::{ActionServer, Upstreams},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load variables from .env if present
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // --- Load env config (fails before serving if destination addresses are missing) ---
    let cfg = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()?;
    let ledger = RpcLedger::new(cfg.solana_rpc_url.clone());

    info!("[server] RPC:     {}", ledger.url());
    info!("[server] Markets: {}", cfg.market_graphql_url);
    info!("[server] Bridge:  {}", cfg.bridge_api_url);
    info!("[server] LP:      {}", cfg.order.lp_address);
    info!("[server] Origin:  {}", cfg.headers.allowed_origin);

    let upstreams = Upstreams {
        market: Arc::new(GraphQlMarketClient::new(http.clone(), cfg.market_graphql_url.clone())),
        bridge: Arc::new(DlnClient::new(http.clone(), cfg.bridge_api_url.clone())),
        ledger: Arc::new(ledger),
        icons: Arc::new(CardRenderer::new(http)),
    };

    let server = Arc::new(ActionServer::new(cfg, upstreams)?);
    server.run().await
}
