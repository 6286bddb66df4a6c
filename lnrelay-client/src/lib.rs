//! # Relay Client SDK
//!
//! A typed Rust client for the Lightning payment relay API.

use lnrelay_types::{ConversionResponse, HealthResponse, NwcPaymentRequest, NwcPaymentResponse};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Relay API client.
pub struct RelayClient {
    base_url: String,
    api_key: Option<String>,
    http: Client,
}

impl RelayClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            http: Client::new(),
        }
    }

    /// Sets the API key sent as `X-API-Key`.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Reachability of one wallet, or of every wallet when `wallet` is `None`.
    pub async fn health(&self, wallet: Option<&str>) -> Result<HealthResponse, ClientError> {
        let mut req = self.http.get(format!("{}/health", self.base_url));
        if let Some(wallet) = wallet {
            req = req.query(&[("wallet_id", wallet)]);
        }
        self.send(req).await
    }

    /// Relays `euro_amount` from `sender` to `recipient`.
    pub async fn pay(
        &self,
        sender: &str,
        recipient: &str,
        euro_amount: Decimal,
    ) -> Result<NwcPaymentResponse, ClientError> {
        let body = NwcPaymentRequest {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            euro_amount,
        };
        let req = self
            .http
            .post(format!("{}/nwc_payment", self.base_url))
            .json(&body);
        self.send(req).await
    }

    /// Quotes `euro_amount` in millisatoshis at the server's current rate.
    pub async fn convert(&self, euro_amount: Decimal) -> Result<ConversionResponse, ClientError> {
        let req = self
            .http
            .get(format!("{}/convert/eur-to-msats", self.base_url))
            .query(&[("amount", euro_amount.to_string())]);
        self.send(req).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        mut req: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        if let Some(key) = &self.api_key {
            req = req.header("X-API-Key", key);
        }
        let resp = req.send().await?;
        self.handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or(body);
            Err(ClientError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
