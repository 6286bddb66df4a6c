//! Relay CLI
//!
//! Command-line interface for the Lightning payment relay API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use lnrelay_client::RelayClient;
use lnrelay_types::HealthStatus;

#[derive(Parser)]
#[command(name = "lnrelay")]
#[command(author, version, about = "Lightning payment relay CLI client", long_about = None)]
struct Cli {
    /// Base URL of the relay API
    #[arg(long, env = "LNRELAY_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    /// API key for authentication
    #[arg(long, env = "LNRELAY_API_KEY")]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay a euro payment between two wallets
    Pay {
        /// Paying wallet id
        #[arg(long)]
        from: String,
        /// Receiving wallet id
        #[arg(long)]
        to: String,
        /// Amount in euros
        #[arg(long)]
        eur: Decimal,
    },
    /// Quote a euro amount in millisatoshis
    Convert {
        /// Amount in euros
        #[arg(long)]
        eur: Decimal,
    },
    /// Check wallet reachability
    Health {
        /// Only probe this wallet
        #[arg(long)]
        wallet: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = RelayClient::new(&cli.api_url);
    if let Some(key) = cli.api_key {
        client = client.with_api_key(key);
    }

    match cli.command {
        Commands::Pay { from, to, eur } => {
            let payment = client.pay(&from, &to, eur).await?;
            println!("{}", serde_json::to_string_pretty(&payment)?);
        }
        Commands::Convert { eur } => {
            let quote = client.convert(eur).await?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
        Commands::Health { wallet } => {
            let report = client.health(wallet.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.status == HealthStatus::Degraded {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
