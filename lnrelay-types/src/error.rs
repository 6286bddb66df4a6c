//! Error types for the payment relay.

use crate::domain::{Side, WalletId};
use crate::ports::ExchangeError;

/// Errors reported by wallet adapters.
///
/// Adapters do not know which side of a transfer they serve; the
/// orchestrator attaches that when converting to [`PaymentError`].
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Settlement failed: {0}")]
    SettlementFailed(String),
}

/// Errors of the relay pipeline and the health probe.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("{}", wallet_not_found(.side, .id))]
    WalletNotFound { side: Option<Side>, id: WalletId },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount too small: converts to zero msats")]
    AmountTooSmall,

    #[error("Insufficient funds: required {required} msats, available {available} msats")]
    InsufficientFunds { required: u64, available: i64 },

    #[error("Exchange rate unavailable: {0}")]
    RateSourceUnavailable(String),

    #[error("Exchange rate could not be parsed: {0}")]
    RateParseError(String),

    #[error("Failed to connect to {side} wallet: {message}")]
    Connection { side: Side, message: String },

    #[error("Unexpected response from {side} wallet: {message}")]
    Protocol { side: Side, message: String },

    #[error("Payment failed: {0}")]
    SettlementFailed(String),

    #[error("Sender and recipient are the same wallet")]
    SameWalletTransfer,

    #[error("Transfer cancelled before {0}")]
    Cancelled(&'static str),
}

fn wallet_not_found(side: &Option<Side>, id: &WalletId) -> String {
    match side {
        Some(side) => format!("{side} wallet '{id}' not found"),
        None => format!("Wallet with ID '{id}' not found"),
    }
}

impl PaymentError {
    /// Attaches the transfer side to an adapter error.
    pub fn wallet(side: Side, err: WalletError) -> Self {
        match err {
            WalletError::Connection(message) => PaymentError::Connection { side, message },
            WalletError::Protocol(message) => PaymentError::Protocol { side, message },
            WalletError::InvalidAmount(msg) => PaymentError::InvalidAmount(msg),
            WalletError::SettlementFailed(msg) => PaymentError::SettlementFailed(msg),
        }
    }

    pub fn not_found(side: Side, id: &WalletId) -> Self {
        PaymentError::WalletNotFound {
            side: Some(side),
            id: id.clone(),
        }
    }
}

impl From<ExchangeError> for PaymentError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::SourceUnavailable(msg) => PaymentError::RateSourceUnavailable(msg),
            ExchangeError::Parse(msg) => PaymentError::RateParseError(msg),
            ExchangeError::InvalidAmount(msg) => PaymentError::InvalidAmount(msg),
        }
    }
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Insufficient funds: required {required} msats, available {available} msats")]
    InsufficientFunds { required: u64, available: i64 },

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        let message = err.to_string();
        match err {
            PaymentError::WalletNotFound { .. } => AppError::NotFound(message),
            PaymentError::InsufficientFunds {
                required,
                available,
            } => AppError::InsufficientFunds {
                required,
                available,
            },
            PaymentError::InvalidAmount(_)
            | PaymentError::AmountTooSmall
            | PaymentError::SameWalletTransfer => AppError::BadRequest(message),
            PaymentError::RateSourceUnavailable(_)
            | PaymentError::RateParseError(_)
            | PaymentError::Connection { .. }
            | PaymentError::Protocol { .. }
            | PaymentError::SettlementFailed(_) => AppError::Upstream(message),
            PaymentError::Cancelled(_) => AppError::Timeout(message),
        }
    }
}
