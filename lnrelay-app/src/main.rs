//! # Lightning Payment Relay
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Load the wallet registry
//! - Create the relay service over NWC wallets and CoinGecko prices
//! - Start the HTTP server

#[cfg(not(feature = "nwc"))]
compile_error!("lnrelay-server needs the `nwc` feature to reach real wallets");

mod config;
mod telemetry;

use std::sync::Arc;

use exchange_rates::{CoinGeckoOracle, RateConverter};
use lnrelay_hex::inbound::{ApiKeyAuth, AppState, HttpServer};
use lnrelay_hex::{HealthProbe, OrchestratorOptions, PaymentOrchestrator};
use lnrelay_wallets::{NwcConnector, load_registry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = config::Config::from_env()?;
    let telemetry = telemetry::init(config.log_format)?;

    tracing::info!("Starting relay server on port {}", config.port);

    let registry = load_registry(&config.wallets_file)?;
    if registry.is_empty() {
        tracing::warn!(
            file = %config.wallets_file.display(),
            "no wallets registered, every relay will fail with 404"
        );
    }
    let ids: Vec<&str> = registry.ids().map(|id| id.as_str()).collect();
    tracing::info!(wallets = ?ids, "wallet registry loaded");
    let registry = Arc::new(registry);

    let connector = NwcConnector::new(config.wallet_timeout);
    let oracle = CoinGeckoOracle::with_base_url(&config.price_oracle_url)?;
    tracing::info!(oracle = oracle.base_url(), "using price oracle");

    let service = PaymentOrchestrator::new(
        Arc::clone(&registry),
        connector.clone(),
        RateConverter::new(oracle),
    )
    .with_options(OrchestratorOptions {
        same_wallet: config.same_wallet,
        serialize_senders: config.serialize_senders,
    });
    let health = HealthProbe::new(registry, connector);
    let state = AppState::new(service, health).with_transfer_timeout(config.transfer_timeout);

    let auth = ApiKeyAuth::new(&config.api_key);
    if auth.is_configured() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!("NWC_API_KEY is not set, every protected request will be rejected");
    }

    let server = HttpServer::with_rate_limit(state, auth, config.rate_limit_per_minute);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    // Ensure traces are flushed before exit
    telemetry.shutdown();
    Ok(())
}
