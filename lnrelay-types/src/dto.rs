//! Data Transfer Objects (DTOs) for requests and responses.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Balance, HealthReport, HealthStatus, Msats, PaymentOutcome};

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to relay a euro-denominated payment between two wallets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NwcPaymentRequest {
    /// Paying wallet, case-insensitive
    #[schema(example = "ALICE")]
    pub sender: String,
    /// Receiving wallet, case-insensitive
    #[schema(example = "BOB")]
    pub recipient: String,
    /// Amount in euros
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 0.05)]
    pub euro_amount: Decimal,
}

/// Response after a successful relay.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NwcPaymentResponse {
    pub success: bool,
    #[schema(example = "Successfully transferred 100000 msats (0.05000000 EUR) from ALICE to BOB")]
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 0.05)]
    pub euro_amount: Decimal,
    /// Amount settled, in millisatoshis
    #[schema(value_type = u64, example = 100000)]
    pub amount_msats: Msats,
    /// Sender balance after the transfer, absent if it could not be fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_balance: Option<Balance>,
    /// Recipient balance after the transfer, absent if it could not be fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_balance: Option<Balance>,
    /// Routing fee paid by the sender, in millisatoshis
    #[schema(value_type = u64, example = 1)]
    pub fees_paid: Msats,
}

impl From<PaymentOutcome> for NwcPaymentResponse {
    fn from(outcome: PaymentOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message(),
            euro_amount: outcome.fiat_amount.eur(),
            amount_msats: outcome.amount,
            sender_balance: outcome.sender_balance,
            recipient_balance: outcome.recipient_balance,
            fees_paid: outcome.fees_paid,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Query for a euro to millisatoshi quote.
///
/// Kept as a string so a missing and a malformed amount can be told apart.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConversionQuery {
    /// Amount in euros
    #[param(value_type = Option<f64>, example = 0.05)]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversionResponse {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 0.05)]
    pub euro_amount: Decimal,
    #[schema(value_type = u64, example = 100000)]
    pub msat_amount: Msats,
}

// ─────────────────────────────────────────────────────────────────────────────
// Health DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HealthQuery {
    /// Probe only this wallet
    pub wallet_id: Option<String>,
}

/// Wallet reachability report.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Reachability per wallet id
    #[schema(example = json!({"ALICE": true, "BOB": false}))]
    pub wallets: BTreeMap<String, bool>,
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        Self {
            status: report.status(),
            wallets: report
                .wallets
                .into_iter()
                .map(|(id, reachable)| (id.into(), reachable))
                .collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Invalid API key")]
    pub error: String,
    #[schema(example = 401)]
    pub code: u16,
}
