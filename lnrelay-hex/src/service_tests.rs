//! PaymentOrchestrator unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use exchange_rates::{ExchangeRate, FixedPriceOracle, RateConverter};
    use lnrelay_types::{FiatAmount, Msats, PaymentError, Side, WalletId};
    use lnrelay_wallets::{Faults, MemoryConnector};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tokio_util::sync::CancellationToken;

    use crate::{OrchestratorOptions, PaymentOrchestrator, SameWalletPolicy};

    type Orchestrator = PaymentOrchestrator<MemoryConnector, FixedPriceOracle>;

    fn orchestrator_with(connector: &MemoryConnector, oracle: FixedPriceOracle) -> Orchestrator {
        PaymentOrchestrator::new(
            Arc::new(connector.registry()),
            connector.clone(),
            RateConverter::new(oracle),
        )
    }

    /// Alice holds 200 000 msats, Bob nothing, fee 1 msat, 50 000 EUR/BTC.
    fn setup() -> (MemoryConnector, Orchestrator) {
        let connector = MemoryConnector::new().with_fee(Msats::new(1));
        connector.add_wallet("A", 200_000);
        connector.add_wallet("B", 0);
        let oracle = FixedPriceOracle::new(ExchangeRate::new(dec!(50000)).unwrap());
        let orchestrator = orchestrator_with(&connector, oracle);
        (connector, orchestrator)
    }

    fn eur(amount: Decimal) -> FiatAmount {
        FiatAmount::new(amount)
    }

    fn id(name: &str) -> WalletId {
        WalletId::new(name)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Happy Path
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_end_to_end_relay() {
        let (connector, service) = setup();

        let outcome = service
            .transfer(&id("A"), &id("B"), eur(dec!(0.05)))
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.amount, Msats::new(100_000));
        assert_eq!(outcome.fees_paid, Msats::new(1));
        assert_eq!(outcome.sender_balance, Some(99_999));
        assert_eq!(outcome.recipient_balance, Some(100_000));
        assert_eq!(connector.calls("A").pay, 1);
        assert_eq!(connector.calls("B").invoice, 1);
        assert_eq!(service.converter().oracle().calls(), 1);
    }

    #[tokio::test]
    async fn test_wallet_ids_are_case_insensitive() {
        let (_connector, service) = setup();

        let outcome = service
            .transfer(&id("a"), &id(" b "), eur(dec!(0.05)))
            .await
            .unwrap();

        assert_eq!(outcome.sender.as_str(), "A");
        assert_eq!(outcome.recipient.as_str(), "B");
    }

    #[tokio::test]
    async fn test_balance_refresh_failure_is_not_fatal() {
        let (connector, service) = setup();
        connector.set_faults(
            "B",
            Faults {
                balance: true,
                ..Faults::default()
            },
        );

        let outcome = service
            .transfer(&id("A"), &id("B"), eur(dec!(0.05)))
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.sender_balance, Some(99_999));
        assert_eq!(outcome.recipient_balance, None);
        assert_eq!(connector.balance("B"), Some(100_000));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_unknown_sender_not_found() {
        let (connector, service) = setup();

        let result = service.transfer(&id("GHOST"), &id("B"), eur(dec!(1))).await;

        assert!(matches!(
            result,
            Err(PaymentError::WalletNotFound {
                side: Some(Side::Sender),
                ..
            })
        ));
        assert_eq!(connector.calls("B").connect, 0);
    }

    #[tokio::test]
    async fn test_unknown_recipient_not_found() {
        let (connector, service) = setup();

        let result = service.transfer(&id("A"), &id("GHOST"), eur(dec!(1))).await;

        assert!(matches!(
            result,
            Err(PaymentError::WalletNotFound {
                side: Some(Side::Recipient),
                ..
            })
        ));
        assert_eq!(connector.calls("A").connect, 0);
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected_before_conversion() {
        let (_connector, service) = setup();

        for amount in [dec!(0), dec!(-0.05)] {
            let result = service.transfer(&id("A"), &id("B"), eur(amount)).await;
            assert!(matches!(result, Err(PaymentError::InvalidAmount(_))));
        }
        assert_eq!(service.converter().oracle().calls(), 0);
    }

    #[tokio::test]
    async fn test_amount_truncating_to_zero_is_too_small() {
        let (connector, service) = setup();

        let result = service
            .transfer(&id("A"), &id("B"), eur(dec!(0.0000000001)))
            .await;

        assert!(matches!(result, Err(PaymentError::AmountTooSmall)));
        assert_eq!(connector.calls("A").connect, 0);
    }

    #[tokio::test]
    async fn test_same_wallet_allowed_by_default() {
        let (connector, service) = setup();

        let outcome = service
            .transfer(&id("A"), &id("a"), eur(dec!(0.05)))
            .await
            .unwrap();

        assert!(outcome.success);
        // Only the fee leaves the wallet.
        assert_eq!(connector.balance("A"), Some(199_999));
    }

    #[tokio::test]
    async fn test_same_wallet_rejected_by_policy() {
        let (connector, service) = setup();
        let service = service.with_options(OrchestratorOptions {
            same_wallet: SameWalletPolicy::Reject,
            ..OrchestratorOptions::default()
        });

        let result = service.transfer(&id("A"), &id("A"), eur(dec!(0.05))).await;

        assert!(matches!(result, Err(PaymentError::SameWalletTransfer)));
        assert_eq!(connector.calls("A").connect, 0);
        assert_eq!(service.converter().oracle().calls(), 0);
    }

    #[test]
    fn test_same_wallet_policy_parses() {
        assert_eq!("allow".parse(), Ok(SameWalletPolicy::Allow));
        assert_eq!(" REJECT ".parse(), Ok(SameWalletPolicy::Reject));
        assert!("maybe".parse::<SameWalletPolicy>().is_err());
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Failures
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_insufficient_funds_never_settles() {
        let (connector, service) = setup();
        connector.set_balance("A", 50_000);

        let result = service.transfer(&id("A"), &id("B"), eur(dec!(0.05))).await;

        match result {
            Err(PaymentError::InsufficientFunds {
                required,
                available,
            }) => {
                assert_eq!(required, 100_000);
                assert_eq!(available, 50_000);
            }
            other => panic!("expected InsufficientFunds, got {other:?}"),
        }
        assert_eq!(connector.calls("B").invoice, 0);
        assert_eq!(connector.calls("A").pay, 0);
    }

    #[tokio::test]
    async fn test_invoice_failure_skips_payment() {
        let (connector, service) = setup();
        connector.set_faults(
            "B",
            Faults {
                invoice: true,
                ..Faults::default()
            },
        );

        let result = service.transfer(&id("A"), &id("B"), eur(dec!(0.05))).await;

        assert!(matches!(
            result,
            Err(PaymentError::Connection {
                side: Side::Recipient,
                ..
            })
        ));
        assert_eq!(connector.calls("A").pay, 0);
        assert_eq!(connector.balance("A"), Some(200_000));
    }

    #[tokio::test]
    async fn test_settlement_failure_is_reported() {
        let (connector, service) = setup();
        connector.set_faults(
            "A",
            Faults {
                settle: true,
                ..Faults::default()
            },
        );

        let result = service.transfer(&id("A"), &id("B"), eur(dec!(0.05))).await;

        assert!(matches!(result, Err(PaymentError::SettlementFailed(_))));
        assert_eq!(connector.calls("A").pay, 1);
        assert_eq!(connector.balance("B"), Some(0));
    }

    #[tokio::test]
    async fn test_rate_source_unavailable() {
        let connector = MemoryConnector::new();
        connector.add_wallet("A", 200_000);
        connector.add_wallet("B", 0);
        let service = orchestrator_with(&connector, FixedPriceOracle::unavailable());

        let result = service.transfer(&id("A"), &id("B"), eur(dec!(0.05))).await;

        assert!(matches!(result, Err(PaymentError::RateSourceUnavailable(_))));
        assert_eq!(connector.calls("A").connect, 0);
    }

    #[tokio::test]
    async fn test_sender_connect_failure_names_side() {
        let (connector, service) = setup();
        connector.set_faults("A", Faults::offline());

        let result = service.transfer(&id("A"), &id("B"), eur(dec!(0.05))).await;

        assert!(matches!(
            result,
            Err(PaymentError::Connection {
                side: Side::Sender,
                ..
            })
        ));
        assert_eq!(connector.calls("B").connect, 0);
    }

    #[tokio::test]
    async fn test_recipient_connect_failure_names_side() {
        let (connector, service) = setup();
        connector.set_faults("B", Faults::offline());

        let result = service.transfer(&id("A"), &id("B"), eur(dec!(0.05))).await;

        assert!(matches!(
            result,
            Err(PaymentError::Connection {
                side: Side::Recipient,
                ..
            })
        ));
        assert_eq!(connector.calls("B").connect, 1);
        assert_eq!(connector.calls("A").balance, 0);
    }

    #[tokio::test]
    async fn test_malformed_sender_balance_is_protocol_error() {
        let (connector, service) = setup();
        connector.set_faults(
            "A",
            Faults {
                malformed: true,
                ..Faults::default()
            },
        );

        let result = service.transfer(&id("A"), &id("B"), eur(dec!(0.05))).await;

        assert!(matches!(
            result,
            Err(PaymentError::Protocol {
                side: Side::Sender,
                ..
            })
        ));
        assert_eq!(connector.calls("A").balance, 1);
        assert_eq!(connector.calls("B").invoice, 0);
        assert_eq!(connector.calls("A").pay, 0);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Cancellation
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (connector, service) = setup();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = service
            .transfer_with_cancel(&id("A"), &id("B"), eur(dec!(0.05)), &cancel)
            .await;

        assert!(matches!(result, Err(PaymentError::Cancelled("conversion"))));
        assert_eq!(service.converter().oracle().calls(), 0);
        assert_eq!(connector.calls("A").connect, 0);
    }

    #[tokio::test]
    async fn test_cancel_during_balance_check_stops_before_invoice() {
        let connector = MemoryConnector::new()
            .with_fee(Msats::new(1))
            .with_latency(Duration::from_millis(50));
        connector.add_wallet("A", 200_000);
        connector.add_wallet("B", 0);
        let service = orchestrator_with(
            &connector,
            FixedPriceOracle::new(ExchangeRate::new(dec!(50000)).unwrap()),
        );
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                cancel.cancel();
            })
        };
        let result = service
            .transfer_with_cancel(&id("A"), &id("B"), eur(dec!(0.05)), &cancel)
            .await;
        canceller.await.unwrap();

        assert!(matches!(result, Err(PaymentError::Cancelled("invoice"))));
        // The in-flight balance query finished, nothing after it started.
        assert_eq!(connector.calls("A").balance, 1);
        assert_eq!(connector.calls("B").invoice, 0);
        assert_eq!(connector.calls("A").pay, 0);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Concurrency
    // ─────────────────────────────────────────────────────────────────────────────

    /// Two concurrent 0.05 EUR relays from a sender that can only cover one.
    async fn race_two_transfers(serialize_senders: bool) -> (MemoryConnector, Vec<PaymentError>) {
        let connector = MemoryConnector::new()
            .with_fee(Msats::new(1))
            .with_latency(Duration::from_millis(20));
        connector.add_wallet("A", 150_000);
        connector.add_wallet("B", 0);
        let service = Arc::new(
            orchestrator_with(
                &connector,
                FixedPriceOracle::new(ExchangeRate::new(dec!(50000)).unwrap()),
            )
            .with_options(OrchestratorOptions {
                serialize_senders,
                ..OrchestratorOptions::default()
            }),
        );

        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.transfer(&id("A"), &id("B"), eur(dec!(0.05))).await })
        };
        let second = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.transfer(&id("A"), &id("B"), eur(dec!(0.05))).await })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        let errors = results.into_iter().filter_map(Result::err).collect();
        (connector, errors)
    }

    #[tokio::test]
    async fn test_unserialized_senders_both_pass_balance_check() {
        let (connector, errors) = race_two_transfers(false).await;

        // Both relays reached settlement; the wallet refused the second.
        assert_eq!(connector.calls("A").pay, 2);
        assert!(matches!(errors[..], [PaymentError::SettlementFailed(_)]));
        assert_eq!(connector.balance("A"), Some(49_999));
    }

    #[tokio::test]
    async fn test_serialized_senders_fail_fast() {
        let (connector, errors) = race_two_transfers(true).await;

        assert_eq!(connector.calls("A").pay, 1);
        assert!(matches!(
            errors[..],
            [PaymentError::InsufficientFunds {
                required: 100_000,
                available: 49_999,
            }]
        ));
        assert_eq!(connector.balance("A"), Some(49_999));
    }
}
