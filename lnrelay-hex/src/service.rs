//! Payment Relay Service
//!
//! Orchestrates a relay through the wallet and price ports.
//! Contains NO infrastructure logic - pure business orchestration.

use std::str::FromStr;
use std::sync::Arc;

use lnrelay_types::domain::payment::transfer_memo;
use lnrelay_types::ports::{PriceOracle, RateConverter};
use lnrelay_types::{
    Balance, FiatAmount, Msats, PaymentError, PaymentOutcome, Side, WalletConnection,
    WalletConnector, WalletId, WalletRegistry,
};
use tokio_util::sync::CancellationToken;

use crate::locks::SenderLocks;

/// What to do when sender and recipient name the same wallet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SameWalletPolicy {
    /// Relay anyway. The wallet pays itself and only loses the fee.
    #[default]
    Allow,
    Reject,
}

impl FromStr for SameWalletPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown same-wallet policy '{other}', expected allow or reject")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrchestratorOptions {
    pub same_wallet: SameWalletPolicy,
    /// Hold a per-sender lock from the balance check through settlement.
    pub serialize_senders: bool,
}

/// Application service relaying euro payments between registered wallets.
///
/// Generic over the wallet connector and the price oracle, both injected at
/// compile time.
pub struct PaymentOrchestrator<C: WalletConnector, O: PriceOracle> {
    registry: Arc<WalletRegistry>,
    connector: C,
    converter: RateConverter<O>,
    options: OrchestratorOptions,
    locks: SenderLocks,
}

impl<C: WalletConnector, O: PriceOracle> PaymentOrchestrator<C, O> {
    pub fn new(registry: Arc<WalletRegistry>, connector: C, converter: RateConverter<O>) -> Self {
        Self {
            registry,
            connector,
            converter,
            options: OrchestratorOptions::default(),
            locks: SenderLocks::new(),
        }
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &Arc<WalletRegistry> {
        &self.registry
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn converter(&self) -> &RateConverter<O> {
        &self.converter
    }

    pub fn options(&self) -> OrchestratorOptions {
        self.options
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Conversion
    // ─────────────────────────────────────────────────────────────────────────────

    /// Quotes `fiat` in millisatoshis at the current rate.
    #[tracing::instrument(skip(self), fields(fiat = %fiat))]
    pub async fn convert(&self, fiat: FiatAmount) -> Result<Msats, PaymentError> {
        Ok(self.converter.convert(fiat).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Relay
    // ─────────────────────────────────────────────────────────────────────────────

    /// Relays `fiat` euros from `sender` to `recipient`.
    pub async fn transfer(
        &self,
        sender: &WalletId,
        recipient: &WalletId,
        fiat: FiatAmount,
    ) -> Result<PaymentOutcome, PaymentError> {
        self.transfer_with_cancel(sender, recipient, fiat, &CancellationToken::new())
            .await
    }

    /// Relays `fiat` euros from `sender` to `recipient`, stopping at the next
    /// step boundary once `cancel` fires.
    ///
    /// Steps run strictly in order and the first failure ends the relay:
    /// resolve both wallets, convert once, connect, check the sender's
    /// balance, have the recipient issue an invoice, have the sender pay it.
    /// Nothing is compensated. A wallet call already in flight is never
    /// aborted, and once the payment is sent the relay runs to completion.
    #[tracing::instrument(skip(self, cancel), fields(sender = %sender, recipient = %recipient, fiat = %fiat))]
    pub async fn transfer_with_cancel(
        &self,
        sender: &WalletId,
        recipient: &WalletId,
        fiat: FiatAmount,
        cancel: &CancellationToken,
    ) -> Result<PaymentOutcome, PaymentError> {
        let sender_descriptor = self
            .registry
            .resolve(sender)
            .ok_or_else(|| PaymentError::not_found(Side::Sender, sender))?;
        let recipient_descriptor = self
            .registry
            .resolve(recipient)
            .ok_or_else(|| PaymentError::not_found(Side::Recipient, recipient))?;

        if sender == recipient {
            if self.options.same_wallet == SameWalletPolicy::Reject {
                return Err(PaymentError::SameWalletTransfer);
            }
            tracing::warn!(wallet_id = %sender, "relaying to the sending wallet itself");
        }

        if !fiat.is_positive() {
            return Err(PaymentError::InvalidAmount(format!(
                "amount must be positive, got {fiat}"
            )));
        }

        checkpoint(cancel, "conversion")?;
        let amount = self.converter.convert(fiat).await?;
        if amount.is_zero() {
            return Err(PaymentError::AmountTooSmall);
        }
        tracing::debug!(%amount, "converted relay amount");

        checkpoint(cancel, "connecting to sender")?;
        let payer = self
            .connector
            .connect(sender_descriptor)
            .map_err(|e| PaymentError::wallet(Side::Sender, e))?;
        checkpoint(cancel, "connecting to recipient")?;
        let payee = self
            .connector
            .connect(recipient_descriptor)
            .map_err(|e| PaymentError::wallet(Side::Recipient, e))?;

        let guard = if self.options.serialize_senders {
            checkpoint(cancel, "sender lock")?;
            tokio::select! {
                guard = self.locks.acquire(sender) => Some(guard),
                _ = cancel.cancelled() => return Err(PaymentError::Cancelled("sender lock")),
            }
        } else {
            None
        };

        checkpoint(cancel, "balance check")?;
        let available = payer
            .get_balance()
            .await
            .map_err(|e| PaymentError::wallet(Side::Sender, e))?;
        if i128::from(available) < i128::from(amount.get()) {
            return Err(PaymentError::InsufficientFunds {
                required: amount.get(),
                available,
            });
        }

        checkpoint(cancel, "invoice")?;
        let memo = transfer_memo(sender, recipient);
        let invoice = payee
            .make_invoice(amount, &memo)
            .await
            .map_err(|e| PaymentError::wallet(Side::Recipient, e))?;

        checkpoint(cancel, "settlement")?;
        let settlement = payer
            .pay_invoice(invoice)
            .await
            .map_err(|e| PaymentError::wallet(Side::Sender, e))?;
        drop(guard);

        if !settlement.success {
            return Err(PaymentError::SettlementFailed(
                "wallet reported the payment as unsuccessful".into(),
            ));
        }
        tracing::info!(%amount, fees_paid = %settlement.fees_paid, "relay settled");

        let (sender_balance, recipient_balance) = tokio::join!(
            refresh_balance(&payer, Side::Sender),
            refresh_balance(&payee, Side::Recipient),
        );

        Ok(PaymentOutcome {
            success: true,
            sender: sender.clone(),
            recipient: recipient.clone(),
            fiat_amount: fiat,
            amount,
            fees_paid: settlement.fees_paid,
            sender_balance,
            recipient_balance,
        })
    }
}

fn checkpoint(cancel: &CancellationToken, step: &'static str) -> Result<(), PaymentError> {
    if cancel.is_cancelled() {
        tracing::info!(step, "relay cancelled");
        return Err(PaymentError::Cancelled(step));
    }
    Ok(())
}

/// Post-settlement balance. Failures are logged and reported as `None`.
async fn refresh_balance<W: WalletConnection>(wallet: &W, side: Side) -> Option<Balance> {
    match wallet.get_balance().await {
        Ok(balance) => Some(balance),
        Err(e) => {
            tracing::warn!(%side, error = %e, "could not refresh balance after settlement");
            None
        }
    }
}
