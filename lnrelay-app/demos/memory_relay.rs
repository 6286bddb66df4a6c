//! Relay demo against in-memory wallets and a fixed euro price.
//!
//! Run with: cargo run -p lnrelay-app --example memory_relay

use std::net::SocketAddr;
use std::sync::Arc;

use exchange_rates::{ExchangeRate, FixedPriceOracle, RateConverter};
use lnrelay_client::RelayClient;
use lnrelay_hex::inbound::{ApiKeyAuth, AppState, HttpServer};
use lnrelay_hex::{HealthProbe, PaymentOrchestrator};
use lnrelay_types::Msats;
use lnrelay_wallets::MemoryConnector;
use rust_decimal_macros::dec;
use tokio::net::TcpListener;

const API_KEY: &str = "demo-key";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter("info").init();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;

    // Two wallets, 1 msat routing fee, 50 000 EUR per BTC
    let wallets = MemoryConnector::new().with_fee(Msats::new(1));
    wallets.add_wallet("alice", 500_000);
    wallets.add_wallet("bob", 0);
    let registry = Arc::new(wallets.registry());

    let service = PaymentOrchestrator::new(
        Arc::clone(&registry),
        wallets.clone(),
        RateConverter::new(FixedPriceOracle::new(ExchangeRate::new(dec!(50000))?)),
    );
    let health = HealthProbe::new(registry, wallets.clone());
    let server = HttpServer::new(AppState::new(service, health), ApiKeyAuth::new(API_KEY));
    let router = server.router();

    println!("🚀 Starting relay on {addr}...");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router.into_make_service()).await {
            eprintln!("server stopped: {e}");
        }
    });

    let client = RelayClient::new(format!("http://{addr}"));

    let health = client.health(None).await?;
    println!("✅ Health: {:?} {:?}", health.status, health.wallets);

    let response = client.pay("alice", "bob", dec!(0.05)).await;
    assert!(response.is_err());
    println!("✅ Unauthorized without key: {}", response.unwrap_err());

    let client = client.with_api_key(API_KEY);

    let quote = client.convert(dec!(0.05)).await?;
    println!("✅ 0.05 EUR quotes at {} msats", quote.msat_amount.get());

    let payment = client.pay("alice", "bob", dec!(0.05)).await?;
    println!("✅ {}", payment.message);
    println!(
        "   Alice balance: {:?} msats, Bob balance: {:?} msats, fee {} msats",
        payment.sender_balance,
        payment.recipient_balance,
        payment.fees_paid.get()
    );

    match client.pay("alice", "bob", dec!(10)).await {
        Err(e) => println!("✅ Oversized payment refused: {e}"),
        Ok(payment) => println!("❌ Unexpected success: {}", payment.message),
    }

    match client.pay("alice", "carol", dec!(0.01)).await {
        Err(e) => println!("✅ Unknown recipient refused: {e}"),
        Ok(payment) => println!("❌ Unexpected success: {}", payment.message),
    }

    Ok(())
}
