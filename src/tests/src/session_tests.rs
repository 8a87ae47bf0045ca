//! End-to-end tests of a bridge session against in-memory ledgers.

use crate::support::*;
use bridge::{
    BridgeError, BridgeEvent, BridgeSession, EventSink, MappingStrategy, NativeCall,
    RecordingSink, SessionConfig, TransferReport,
};
use primitives::{
    derive_execution_address, parse_amount, Anomaly, MappingState, SignatureVariant, TxState,
    H160, I256, U256,
};
use std::sync::{Arc, Mutex};

type TestSession = BridgeSession<MockNative, MockExecution>;

fn session(world: Arc<Mutex<World>>, native: MockNative) -> (TestSession, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let config = SessionConfig {
        token_view: Some(H160::from_low_u64_be(0x0100_0000)),
        ..SessionConfig::default()
    };
    let shared: Arc<dyn EventSink> = sink.clone();
    let session = BridgeSession::new(native, MockExecution::new(world), config, shared);
    (session, sink)
}

fn completed(report: TransferReport) -> (primitives::TransferOutcome, primitives::ReconciliationResult) {
    match report {
        TransferReport::Completed {
            outcome,
            reconciliation,
            ..
        } => (outcome, reconciliation),
        other => panic!("expected a completed transfer, got {:?}", other),
    }
}

/// Tests funding the signer's own execution account with a two-argument transfer.
#[tokio::test]
async fn test_fund_own_account() {
    let world = funded_world(units(1000));
    let native = MockNative::new(world.clone(), Some(two_arg_metadata()));
    native.script(happy(Effect::Transfer { fee: U256::exp10(15) }));
    let (session, sink) = session(world, native);

    assert_eq!(session.chain_name().await.unwrap(), "Development");
    let amount = parse_amount("10.0").unwrap();
    let (account, report) = session
        .fund_own_account(signer(), MappingStrategy::Derive, amount)
        .await
        .unwrap();

    assert_eq!(account.execution_address, Some(derive_execution_address(&SIGNER_KEY)));
    assert_eq!(report.anomaly(), None);
    let (outcome, reconciliation) = completed(report);
    assert_eq!(outcome.state, TxState::Finalized);
    assert_eq!(reconciliation.execution_delta, I256::from_dec_str("10000000000000000000").unwrap());
    assert_eq!(
        reconciliation.native_delta,
        -I256::from_dec_str("10001000000000000000").unwrap()
    );
    assert!(reconciliation.after.taken_at > reconciliation.before.taken_at);

    let events = sink.events();
    assert_eq!(events[0], BridgeEvent::Connected { chain: "Development".to_string() });
    let labels: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            BridgeEvent::SnapshotTaken { label, .. } => Some(*label),
            _ => None,
        })
        .collect();
    assert_eq!(labels, vec!["before", "after"]);
}

/// Tests the fee-only transfer that never reaches the execution layer.
#[tokio::test]
async fn test_fee_only_transfer_is_flagged() {
    let world = funded_world(U256::from_dec_str("1000000000000000000000").unwrap());
    let native = MockNative::new(world.clone(), Some(two_arg_metadata()));
    native.script(happy(Effect::FeeOnly { fee: units(10) }));
    let (session, sink) = session(world, native);

    let (_, report) = session
        .fund_own_account(signer(), MappingStrategy::Derive, units(10))
        .await
        .unwrap();

    let (outcome, reconciliation) = completed(report);
    assert!(outcome.is_success());
    assert_eq!(
        reconciliation.after.native_free,
        U256::from_dec_str("990000000000000000000").unwrap()
    );
    assert_eq!(reconciliation.execution_delta, I256::zero());
    assert_eq!(reconciliation.anomaly, Some(Anomaly::NoOpTransfer));
    assert!(sink.events().contains(&BridgeEvent::AnomalyDetected {
        anomaly: Anomaly::NoOpTransfer
    }));
}

/// Tests that a native-only transfer call is skipped before submission.
#[tokio::test]
async fn test_native_only_transfer_is_skipped() {
    let world = funded_world(units(10));
    let native = MockNative::new(world.clone(), Some(native_only_metadata()));
    let (session, sink) = session(world, native);

    let (_, report) = session
        .fund_own_account(signer(), MappingStrategy::Derive, units(1))
        .await
        .unwrap();

    match report {
        TransferReport::Skipped { signature, before } => {
            assert_eq!(signature.variant, SignatureVariant::NativeOnlyTransfer);
            assert_eq!(before.native_free, units(10));
        }
        other => panic!("expected a skip, got {:?}", other),
    }
    assert!(session.native().submitted().is_empty());
    assert!(sink
        .events()
        .iter()
        .any(|event| matches!(event, BridgeEvent::TransferSkipped { .. })));
}

/// Tests a runtime without transfer metadata.
#[tokio::test]
async fn test_missing_metadata_uses_fallback() {
    let world = funded_world(units(10));
    let native = MockNative::new(world.clone(), None);
    native.script(happy(Effect::Transfer { fee: U256::zero() }));
    let (session, _) = session(world, native);

    let (_, report) = session
        .fund_own_account(signer(), MappingStrategy::Derive, units(1))
        .await
        .unwrap();

    assert_eq!(report.anomaly(), Some(Anomaly::SignatureUnresolved));
    let (outcome, _) = completed(report);
    assert!(outcome.signature_fallback);
    assert_eq!(outcome.warnings.len(), 1);
}

/// Tests that the signature is resolved once per session.
#[tokio::test]
async fn test_signature_is_cached() {
    let world = funded_world(units(10));
    let native = MockNative::new(world.clone(), Some(two_arg_metadata()));
    native.script(happy(Effect::Transfer { fee: U256::zero() }));
    native.script(happy(Effect::Transfer { fee: U256::zero() }));
    let (session, sink) = session(world, native);

    let first = session.signature().await.unwrap().clone();
    let (account, _) = session
        .fund_own_account(signer(), MappingStrategy::Derive, units(1))
        .await
        .unwrap();
    session
        .transfer(account, H160::repeat_byte(0x77), units(2))
        .await
        .unwrap();

    assert_eq!(first.variant, SignatureVariant::TwoArgTargetAmount);
    assert_eq!(session.native().metadata_queries(), 1);
    assert_eq!(
        sink.events()
            .iter()
            .filter(|event| matches!(event, BridgeEvent::SignatureResolved { .. }))
            .count(),
        1
    );
}

/// Tests that an unmapped source aborts before anything is read or sent.
#[tokio::test]
async fn test_unmapped_source_is_refused() {
    let world = funded_world(units(10));
    let native = MockNative::new(world.clone(), Some(two_arg_metadata()));
    let (session, sink) = session(world, native);

    let err = session
        .transfer(signer(), H160::repeat_byte(0x77), units(1))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::MappingMissing { .. }));
    assert!(session.native().submitted().is_empty());
    assert!(sink.events().is_empty());
}

/// Tests sending to an arbitrary execution address after a claim.
#[tokio::test]
async fn test_send_to_other_target() {
    let claimed = H160::repeat_byte(0x42);
    let target = H160::repeat_byte(0x77);
    let world = funded_world(units(50));
    let native = MockNative::new(world.clone(), Some(two_arg_metadata()));
    native.script(happy(Effect::Claim(claimed)));
    native.script(happy(Effect::Transfer { fee: U256::zero() }));
    let (session, _) = session(world.clone(), native);

    let (account, report) = session
        .send_to(signer(), MappingStrategy::Claim, target, parse_amount("2.5").unwrap())
        .await
        .unwrap();

    assert_eq!(account.mapping_state, MappingState::Claimed);
    assert_eq!(account.execution_address, Some(claimed));
    let (_, reconciliation) = completed(report);
    assert_eq!(reconciliation.execution_delta, I256::from_dec_str("2500000000000000000").unwrap());
    assert_eq!(world.lock().unwrap().execution.get(&claimed), None);
    assert!(matches!(session.native().submitted()[0], NativeCall::ClaimDefaultAccount));
}

/// Tests a transfer the runtime rejects.
#[tokio::test]
async fn test_dispatch_error_is_reported() {
    let world = funded_world(units(50));
    let native = MockNative::new(world.clone(), Some(two_arg_metadata()));
    native.script(Reply::new(
        vec![
            in_block(9, Vec::new(), Some("Revive.TransferFailed")),
            finalized(9, Vec::new(), Some("Revive.TransferFailed")),
        ],
        Effect::FeeOnly { fee: U256::one() },
    ));
    let (session, _) = session(world, native);

    let (_, report) = session
        .fund_own_account(signer(), MappingStrategy::Derive, units(1))
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "completed");

    let (outcome, reconciliation) = completed(report);
    assert_eq!(outcome.state, TxState::DispatchError);
    assert_eq!(outcome.error.as_deref(), Some("Revive.TransferFailed"));
    assert_eq!(reconciliation.anomaly, None);
    assert_eq!(reconciliation.native_delta, I256::from(-1));
}

/// Tests the address summary of an account with no reverse mapping.
#[tokio::test]
async fn test_summary_without_reverse_mapping() {
    let world = funded_world(units(7));
    world.lock().unwrap().native.get_mut(SIGNER).unwrap().reserved = units(1);
    let native = MockNative::new(world.clone(), Some(two_arg_metadata()));
    let (session, sink) = session(world, native);

    let summary = session
        .address_summary(signer(), MappingStrategy::Derive)
        .await
        .unwrap();

    assert_eq!(summary.native_free, units(7));
    assert_eq!(summary.native_reserved, units(1));
    assert_eq!(summary.execution_raw_balance, U256::zero());
    assert_eq!(summary.execution_token_balance, Some(U256::zero()));
    assert_eq!(summary.reverse_mapping, None);
    assert_eq!(summary.anomaly, Some(Anomaly::MappingMissing));
    assert!(sink.events().contains(&BridgeEvent::AnomalyDetected {
        anomaly: Anomaly::MappingMissing
    }));
}

/// Tests the address summary after registering the derived address.
#[tokio::test]
async fn test_summary_after_registration() {
    let world = funded_world(units(7));
    let native = MockNative::new(world.clone(), Some(two_arg_metadata()));
    native.script(happy(Effect::Register(derive_execution_address(&SIGNER_KEY))));
    let (session, _) = session(world, native);

    let summary = session
        .address_summary(signer(), MappingStrategy::MapAndDerive)
        .await
        .unwrap();

    assert_eq!(summary.reverse_mapping, Some(SIGNER.to_string()));
    assert_eq!(summary.anomaly, None);
}

/// Tests the balance lookup of an address the ledger has never seen.
#[tokio::test]
async fn test_native_balance_of_unknown_address() {
    let world = funded_world(units(7));
    let native = MockNative::new(world.clone(), None);
    let (session, _) = session(world, native);

    let info = session
        .native_balance("5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty")
        .await
        .unwrap();
    assert_eq!(info.free, U256::zero());
    assert_eq!(info.nonce, 0);
}

/// Tests a session configured from the CLI defaults.
#[tokio::test]
async fn test_session_from_cli_defaults() {
    let config = cli::BridgeConfig::default().session_config().unwrap();
    assert_eq!(
        config.token_view,
        Some(primitives::parse_execution_address(bridge::NATIVE_TOKEN_VIEW).unwrap())
    );
    assert_eq!(config.finality_timeout, None);

    let world = funded_world(units(3));
    let native = MockNative::new(world.clone(), Some(two_arg_metadata()));
    let session = BridgeSession::new(native, MockExecution::new(world), config, Arc::new(RecordingSink::new()));
    let snapshot = session
        .snapshot(SIGNER, derive_execution_address(&SIGNER_KEY))
        .await
        .unwrap();
    assert_eq!(snapshot.execution_token_balance, Some(U256::zero()));
}
