//! BTC/EUR exchange rates and fiat to millisatoshi conversion.
//!
//! Amounts on the fiat side are decimal euros ([`FiatAmount`]), amounts on
//! the Lightning side are integer millisatoshis ([`Msats`]). The two types are
//! never interchangeable: the only way from one to the other is
//! [`eur_to_msats`], which needs an [`ExchangeRate`].
//!
//! # Example
//! ```
//! use exchange_rates::{ExchangeRate, FiatAmount, eur_to_msats};
//! use rust_decimal::Decimal;
//!
//! let rate = ExchangeRate::new(Decimal::new(50_000, 0)).unwrap();
//! let fiat = FiatAmount::new(Decimal::new(5, 2)); // 0.05 EUR
//!
//! let msats = eur_to_msats(fiat, rate).unwrap();
//! assert_eq!(msats.get(), 100_000);
//! ```

mod converter;
mod oracle;

pub use converter::RateConverter;
pub use oracle::{COINGECKO_BASE_URL, CoinGeckoOracle, FixedPriceOracle, ORACLE_TIMEOUT, PriceOracle};

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ─────────────────────────────────────────────────────────────────────────────
// Unit Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Satoshis in one bitcoin.
pub const SATS_PER_BTC: i64 = 100_000_000;

/// Millisatoshis in one satoshi.
pub const MSATS_PER_SAT: i64 = 1_000;

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Error type for exchange rate operations.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("Rate source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Could not parse exchange rate: {0}")]
    Parse(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Fiat Side
// ─────────────────────────────────────────────────────────────────────────────

/// A euro amount with arbitrary decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FiatAmount(Decimal);

impl FiatAmount {
    pub fn new(eur: Decimal) -> Self {
        Self(eur)
    }

    /// Converts a float as received on the wire, going through its shortest
    /// decimal representation so `0.05` stays `0.05`.
    pub fn from_f64(eur: f64) -> Option<Self> {
        if !eur.is_finite() {
            return None;
        }
        Decimal::from_str(&eur.to_string()).ok().map(Self)
    }

    pub fn eur(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl fmt::Display for FiatAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} EUR", self.0)
    }
}

/// Price of one bitcoin in euros. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    pub fn new(eur_per_btc: Decimal) -> Result<Self, ExchangeError> {
        if eur_per_btc <= Decimal::ZERO {
            return Err(ExchangeError::Parse(format!(
                "rate must be positive, got {eur_per_btc}"
            )));
        }
        Ok(Self(eur_per_btc))
    }

    pub fn from_f64(eur_per_btc: f64) -> Result<Self, ExchangeError> {
        if !eur_per_btc.is_finite() {
            return Err(ExchangeError::Parse(format!(
                "rate must be a finite number, got {eur_per_btc}"
            )));
        }
        let rate = Decimal::from_str(&eur_per_btc.to_string()).map_err(|_| {
            ExchangeError::Parse(format!("rate {eur_per_btc} is out of range"))
        })?;
        Self::new(rate)
    }

    pub fn eur_per_btc(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} EUR/BTC", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settlement Side
// ─────────────────────────────────────────────────────────────────────────────

/// An amount in millisatoshis, the smallest Lightning accounting unit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct Msats(u64);

impl Msats {
    pub const ZERO: Msats = Msats(0);

    pub const fn new(msats: u64) -> Self {
        Self(msats)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Msats {
    fn from(msats: u64) -> Self {
        Self(msats)
    }
}

impl fmt::Display for Msats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} msat", self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Converts euros to millisatoshis at the given rate.
///
/// Computes `floor(fiat / rate * SATS_PER_BTC * MSATS_PER_SAT)`. The result is
/// truncated toward zero, never rounded up, so a payer is never asked for more
/// than the fiat amount covers.
pub fn eur_to_msats(fiat: FiatAmount, rate: ExchangeRate) -> Result<Msats, ExchangeError> {
    if fiat.is_negative() {
        return Err(ExchangeError::InvalidAmount(format!(
            "cannot convert a negative amount ({fiat})"
        )));
    }

    // Scale before dividing so the quotient keeps as many fractional digits as possible.
    let msats = fiat
        .eur()
        .checked_mul(Decimal::from(SATS_PER_BTC))
        .and_then(|sats| sats.checked_mul(Decimal::from(MSATS_PER_SAT)))
        .and_then(|scaled| scaled.checked_div(rate.eur_per_btc()))
        .ok_or_else(|| ExchangeError::InvalidAmount(format!("{fiat} is out of range")))?;

    msats
        .trunc()
        .to_u64()
        .map(Msats::new)
        .ok_or_else(|| ExchangeError::InvalidAmount(format!("{fiat} is out of range")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
