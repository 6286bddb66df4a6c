use crate::{ExchangeError, ExchangeRate, FiatAmount, Msats, PriceOracle, eur_to_msats};

/// Converts euro amounts to millisatoshis at the oracle's current rate.
///
/// The rate is fetched on every conversion.
#[derive(Debug, Clone)]
pub struct RateConverter<O> {
    oracle: O,
}

impl<O: PriceOracle> RateConverter<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub async fn current_rate(&self) -> Result<ExchangeRate, ExchangeError> {
        self.oracle.eur_per_btc().await
    }

    /// Fetches the rate once and converts `fiat` with it.
    ///
    /// Negative amounts are rejected before the oracle is queried.
    pub async fn convert(&self, fiat: FiatAmount) -> Result<Msats, ExchangeError> {
        if fiat.is_negative() {
            return Err(ExchangeError::InvalidAmount(format!(
                "cannot convert a negative amount ({fiat})"
            )));
        }

        let rate = self.current_rate().await?;
        let msats = eur_to_msats(fiat, rate)?;
        tracing::debug!(%fiat, %rate, %msats, "converted fiat amount");
        Ok(msats)
    }
}
