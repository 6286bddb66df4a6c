//! Exchange rate port.
//!
//! The trait and its adapters live in `exchange-rates`; they are re-exported
//! here so the service layer sees every port in one place.

pub use exchange_rates::{ExchangeError, PriceOracle, RateConverter};
