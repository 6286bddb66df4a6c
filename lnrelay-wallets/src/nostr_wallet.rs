//! Nostr Wallet Connect (NIP-47) binding.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use lnrelay_types::{
    Balance, ConnectionDescriptor, Invoice, Msats, SettlementResult, WalletConnection,
    WalletConnector, WalletError,
};
use nwc::prelude::{MakeInvoiceRequest, NWC, NostrWalletConnectURI, PayInvoiceRequest};

/// Default bound for balance and invoice requests.
pub const DEFAULT_WALLET_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens NWC sessions from `nostr+walletconnect://` descriptors.
#[derive(Debug, Clone)]
pub struct NwcConnector {
    timeout: Duration,
}

impl NwcConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for NwcConnector {
    fn default() -> Self {
        Self::new(DEFAULT_WALLET_TIMEOUT)
    }
}

impl WalletConnector for NwcConnector {
    type Connection = NwcConnection;

    fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<NwcConnection, WalletError> {
        // The parse error can echo the URI back, secret included.
        let uri = NostrWalletConnectURI::from_str(descriptor.expose())
            .map_err(|_| WalletError::Connection("malformed wallet connect URI".into()))?;

        Ok(NwcConnection {
            client: NWC::new(uri),
            timeout: self.timeout,
        })
    }
}

/// One NWC session. Relay connections are opened lazily on first use.
pub struct NwcConnection {
    client: NWC,
    timeout: Duration,
}

/// Error replies and undecodable responses are the wallet's answer, so they
/// are protocol errors. Relay and pool failures mean the wallet was never
/// reached.
fn wallet_error(what: &str, error: nwc::Error) -> WalletError {
    match error {
        nwc::Error::NIP47(e) => WalletError::Protocol(format!("{what}: {e}")),
        other => WalletError::Connection(format!("{what}: {other}")),
    }
}

async fn bounded<T>(
    timeout: Duration,
    what: &str,
    fut: impl std::future::Future<Output = Result<T, nwc::Error>>,
) -> Result<T, WalletError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(|e| wallet_error(what, e)),
        Err(_) => Err(WalletError::Connection(format!(
            "{what}: timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

#[async_trait]
impl WalletConnection for NwcConnection {
    async fn get_balance(&self) -> Result<Balance, WalletError> {
        let msats = bounded(self.timeout, "get_balance", self.client.get_balance()).await?;
        Balance::try_from(msats)
            .map_err(|_| WalletError::Protocol(format!("balance {msats} msats is out of range")))
    }

    async fn make_invoice(&self, amount: Msats, memo: &str) -> Result<Invoice, WalletError> {
        if amount.is_zero() {
            return Err(WalletError::InvalidAmount(
                "invoice amount must be positive".into(),
            ));
        }

        let request = MakeInvoiceRequest {
            amount: amount.get(),
            description: Some(memo.to_string()),
            description_hash: None,
            expiry: None,
        };
        let response =
            bounded(self.timeout, "make_invoice", self.client.make_invoice(request)).await?;
        if response.invoice.is_empty() {
            return Err(WalletError::Protocol("wallet returned an empty invoice".into()));
        }

        Ok(Invoice::new(response.invoice, amount, memo))
    }

    async fn pay_invoice(&self, invoice: Invoice) -> Result<SettlementResult, WalletError> {
        // Not bounded: once sent, a payment cannot be recalled.
        let response = self
            .client
            .pay_invoice(PayInvoiceRequest::new(invoice.bolt11))
            .await
            .map_err(|e| WalletError::SettlementFailed(e.to_string()))?;

        Ok(SettlementResult {
            success: true,
            fees_paid: Msats::new(response.fees_paid.unwrap_or(0)),
            preimage: Some(response.preimage),
        })
    }
}
