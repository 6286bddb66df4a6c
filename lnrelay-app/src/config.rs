//! Configuration loading from environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use exchange_rates::COINGECKO_BASE_URL;
use lnrelay_hex::SameWalletPolicy;

use crate::telemetry::LogFormat;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Shared API key. Empty means every protected route answers 401.
    pub api_key: String,
    /// Dotenv file holding the `ID=nostr+walletconnect://...` entries.
    pub wallets_file: PathBuf,
    pub price_oracle_url: String,
    pub rate_limit_per_minute: u32,
    pub same_wallet: SameWalletPolicy,
    pub serialize_senders: bool,
    pub wallet_timeout: Duration,
    pub transfer_timeout: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port: parse_or(&var, "PORT", 8080)?,
            api_key: var("NWC_API_KEY").unwrap_or_default(),
            wallets_file: var("WALLETS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".env")),
            price_oracle_url: var("PRICE_ORACLE_URL")
                .unwrap_or_else(|| COINGECKO_BASE_URL.to_string()),
            rate_limit_per_minute: parse_or(&var, "RATE_LIMIT_PER_MINUTE", 100)?,
            same_wallet: var("SAME_WALLET_POLICY")
                .map(|raw| raw.parse().map_err(anyhow::Error::msg))
                .transpose()
                .context("invalid SAME_WALLET_POLICY")?
                .unwrap_or_default(),
            serialize_senders: var("SERIALIZE_SENDERS")
                .map(|raw| parse_flag(&raw))
                .transpose()
                .context("invalid SERIALIZE_SENDERS")?
                .unwrap_or(false),
            wallet_timeout: Duration::from_secs(parse_or(&var, "WALLET_TIMEOUT_SECS", 30)?),
            transfer_timeout: Duration::from_secs(parse_or(&var, "TRANSFER_TIMEOUT_SECS", 120)?),
            log_format: parse_or(&var, "LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key} '{raw}': {e}")),
        None => Ok(default),
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected true or false, got '{other}'"),
    }
}
