//! Price oracle port and its implementations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{ExchangeError, ExchangeRate};

/// Public CoinGecko API.
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com";

/// Upper bound for one price query, connection and body included.
pub const ORACLE_TIMEOUT: Duration = Duration::from_secs(10);

const SIMPLE_PRICE_PATH: &str = "/api/v3/simple/price";

/// Port trait for BTC/EUR price sources.
///
/// Every call is a fresh query. Implementations must not cache.
#[async_trait::async_trait]
pub trait PriceOracle: Send + Sync + 'static {
    /// Returns the current price of one bitcoin in euros.
    async fn eur_per_btc(&self) -> Result<ExchangeRate, ExchangeError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// CoinGecko
// ─────────────────────────────────────────────────────────────────────────────

/// `{"bitcoin":{"eur": 61234.5}}`
#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    bitcoin: Option<AssetPrices>,
}

#[derive(Debug, Deserialize)]
struct AssetPrices {
    eur: Option<f64>,
}

/// Queries the CoinGecko simple-price endpoint.
#[derive(Debug, Clone)]
pub struct CoinGeckoOracle {
    base_url: String,
    http: Client,
}

impl CoinGeckoOracle {
    /// Creates an oracle against the public CoinGecko API.
    pub fn new() -> Result<Self, ExchangeError> {
        Self::with_base_url(COINGECKO_BASE_URL)
    }

    /// Creates an oracle against another host serving the same API.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ExchangeError> {
        Self::with_timeout(base_url, ORACLE_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeError::SourceUnavailable(format!("HTTP client setup: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl PriceOracle for CoinGeckoOracle {
    #[tracing::instrument(skip(self), fields(base_url = %self.base_url))]
    async fn eur_per_btc(&self) -> Result<ExchangeRate, ExchangeError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, SIMPLE_PRICE_PATH))
            .query(&[("ids", "bitcoin"), ("vs_currencies", "eur")])
            .send()
            .await
            .map_err(|e| {
                ExchangeError::SourceUnavailable(format!("failed to fetch exchange rate: {e}"))
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ExchangeError::SourceUnavailable(format!(
                "price API returned non-200 status: {status}"
            )));
        }

        let body: SimplePriceResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                ExchangeError::SourceUnavailable(format!("price API timed out: {e}"))
            } else {
                ExchangeError::Parse(format!("failed to parse price API response: {e}"))
            }
        })?;

        let eur = body
            .bitcoin
            .and_then(|prices| prices.eur)
            .ok_or_else(|| {
                ExchangeError::Parse("could not find BTC/EUR exchange rate in response".into())
            })?;

        let rate = ExchangeRate::from_f64(eur)?;
        tracing::debug!(%rate, "fetched exchange rate");
        Ok(rate)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixed Rate (development and tests)
// ─────────────────────────────────────────────────────────────────────────────

/// Oracle answering with a constant rate, or always failing.
///
/// Counts queries so callers can check how often the rate was fetched.
#[derive(Debug)]
pub struct FixedPriceOracle {
    rate: Option<ExchangeRate>,
    calls: AtomicUsize,
}

impl FixedPriceOracle {
    pub fn new(rate: ExchangeRate) -> Self {
        Self {
            rate: Some(rate),
            calls: AtomicUsize::new(0),
        }
    }

    /// An oracle whose every query fails with `SourceUnavailable`.
    pub fn unavailable() -> Self {
        Self {
            rate: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of queries answered so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PriceOracle for FixedPriceOracle {
    async fn eur_per_btc(&self) -> Result<ExchangeRate, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rate
            .ok_or_else(|| ExchangeError::SourceUnavailable("price oracle is offline".into()))
    }
}

#[async_trait::async_trait]
impl<O: PriceOracle> PriceOracle for std::sync::Arc<O> {
    async fn eur_per_btc(&self) -> Result<ExchangeRate, ExchangeError> {
        (**self).eur_per_btc().await
    }
}
