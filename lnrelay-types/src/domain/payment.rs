//! Invoices, settlement results and transfer outcomes.

use super::money::{Balance, FiatAmount, Msats};
use super::wallet::WalletId;

/// A single-use BOLT11 payment request minted by the recipient.
///
/// Paying consumes it by value, so the same invoice cannot be handed to
/// `pay_invoice` twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub bolt11: String,
    pub amount: Msats,
    pub memo: String,
}

impl Invoice {
    pub fn new(bolt11: impl Into<String>, amount: Msats, memo: impl Into<String>) -> Self {
        Self {
            bolt11: bolt11.into(),
            amount,
            memo: memo.into(),
        }
    }
}

/// What the paying wallet reports after settling an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementResult {
    pub success: bool,
    pub fees_paid: Msats,
    pub preimage: Option<String>,
}

/// Result of a completed relay.
///
/// Post-transfer balances are `None` when the refresh after settlement failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub success: bool,
    pub sender: WalletId,
    pub recipient: WalletId,
    pub fiat_amount: FiatAmount,
    pub amount: Msats,
    pub fees_paid: Msats,
    pub sender_balance: Option<Balance>,
    pub recipient_balance: Option<Balance>,
}

impl PaymentOutcome {
    pub fn message(&self) -> String {
        format!(
            "Successfully transferred {} msats ({:.8} EUR) from {} to {}",
            self.amount.get(),
            self.fiat_amount.eur(),
            self.sender,
            self.recipient
        )
    }
}

/// Memo attached to the invoice of a relay from `sender` to `recipient`.
pub fn transfer_memo(sender: &WalletId, recipient: &WalletId) -> String {
    format!("Payment from {sender} to {recipient}")
}
