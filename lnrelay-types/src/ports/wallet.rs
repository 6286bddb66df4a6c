//! Wallet connection port.

use crate::domain::{Balance, ConnectionDescriptor, Invoice, Msats, SettlementResult};
use crate::error::WalletError;

/// An authenticated session with one payment endpoint.
///
/// Every method is a single attempt. Implementations do not retry.
#[async_trait::async_trait]
pub trait WalletConnection: Send + Sync {
    /// Current balance in millisatoshis.
    async fn get_balance(&self) -> Result<Balance, WalletError>;

    /// Asks this wallet to mint an invoice for exactly `amount`.
    ///
    /// `amount` must be positive; a zero amount fails with `InvalidAmount`.
    async fn make_invoice(&self, amount: Msats, memo: &str) -> Result<Invoice, WalletError>;

    /// Pays an invoice minted by another wallet.
    ///
    /// Routing, liquidity and expiry problems are all reported as
    /// `SettlementFailed`.
    async fn pay_invoice(&self, invoice: Invoice) -> Result<SettlementResult, WalletError>;
}

/// Opens [`WalletConnection`]s from registry descriptors.
pub trait WalletConnector: Send + Sync + 'static {
    type Connection: WalletConnection + 'static;

    /// Builds a connection. Fails with `Connection` for malformed or rejected
    /// descriptors.
    fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<Self::Connection, WalletError>;
}
