//! Amounts on both sides of a relay.
//!
//! Fiat amounts, rates and millisatoshis come from `exchange-rates`, which
//! owns the conversion between them.

pub use exchange_rates::{ExchangeRate, FiatAmount, MSATS_PER_SAT, Msats, SATS_PER_BTC};

/// A wallet balance snapshot in millisatoshis.
///
/// Signed, since some wallet backends report overdrafts or channel reserves
/// as negative numbers.
pub type Balance = i64;
