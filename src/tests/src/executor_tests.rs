//! Tests for submission and the wait for finality.

use crate::support::*;
use bridge::{
    BridgeError, BridgeEvent, NativeCall, RecordingSink, StatusNotice, TransferExecutor,
    FALLBACK_WARNING,
};
use primitives::{
    CallSignature, SignatureVariant, TransferCall, TransferRequest, TxState, H160, U256,
};
use std::time::Duration;

fn request(amount: U256) -> TransferRequest {
    let mut source = signer();
    source
        .record_mapping(H160::repeat_byte(0xaa), primitives::MappingState::Claimed)
        .unwrap();
    TransferRequest {
        source,
        target_execution_address: H160::repeat_byte(0xaa),
        amount_minor_units: amount,
    }
}

fn signature(variant: SignatureVariant) -> CallSignature {
    CallSignature {
        variant,
        arg_names: vec!["dest".to_string(), "value".to_string()],
        arg_type_hints: vec!["H160".to_string(), "Balance".to_string()],
    }
}

fn states(sink: &RecordingSink) -> Vec<TxState> {
    sink.events()
        .into_iter()
        .filter_map(|event| match event {
            BridgeEvent::StatusChanged { state, .. } => Some(state),
            _ => None,
        })
        .collect()
}

/// Tests a transfer that is included and finalized cleanly.
#[tokio::test]
async fn test_transfer_reaches_finality() {
    let world = funded_world(units(1000));
    let native = MockNative::new(world.clone(), None);
    native.script(happy(Effect::Transfer { fee: U256::zero() }));
    let sink = RecordingSink::new();

    let executor = TransferExecutor::new(&native, &sink, None);
    let outcome = executor
        .execute(&request(units(10)), &signature(SignatureVariant::TwoArgTargetAmount))
        .await
        .unwrap();

    assert_eq!(outcome.state, TxState::Finalized);
    assert!(outcome.is_success());
    assert_eq!(outcome.block_ref, Some(block(1)));
    assert_eq!(outcome.emitted_events, success_events());
    assert!(!outcome.signature_fallback);
    assert!(outcome.warnings.is_empty());
    assert_eq!(
        states(&sink),
        vec![TxState::Submitted, TxState::Included, TxState::Finalized]
    );
    assert_eq!(native.unsubscribes(), 1);

    // The 2-argument call carries the full amount in minor units
    assert_eq!(
        native.submitted(),
        vec![NativeCall::Transfer(TransferCall::TargetAmount {
            target: H160::repeat_byte(0xaa),
            amount: 10_000_000_000_000_000_000,
        })]
    );
    assert_eq!(
        world.lock().unwrap().execution[&H160::repeat_byte(0xaa)],
        units(10)
    );
}

/// Tests that finality without a prior in-block notice still reports inclusion first.
#[tokio::test]
async fn test_finality_without_in_block_reports_inclusion() {
    let native = MockNative::new(funded_world(units(5)), None);
    native.script(Reply::new(
        vec![Ok(StatusNotice::Pending), finalized(2, success_events(), None)],
        Effect::Nothing,
    ));
    let sink = RecordingSink::new();

    let outcome = TransferExecutor::new(&native, &sink, None)
        .submit_and_wait(NativeCall::MapAccount, "registration")
        .await
        .unwrap();

    assert_eq!(outcome.state, TxState::Finalized);
    assert_eq!(
        states(&sink),
        vec![TxState::Submitted, TxState::Included, TxState::Finalized]
    );
}

/// Tests that a dispatch error is recorded on the outcome rather than raised.
#[tokio::test]
async fn test_dispatch_error_is_recorded() {
    let native = MockNative::new(funded_world(units(5)), None);
    let failed = vec![primitives::ChainEvent::new("System", "ExtrinsicFailed")];
    native.script(Reply::new(
        vec![
            in_block(3, failed.clone(), Some("Revive.TransferFailed")),
            finalized(3, failed.clone(), Some("Revive.TransferFailed")),
        ],
        Effect::FeeOnly { fee: U256::one() },
    ));
    let sink = RecordingSink::new();

    let outcome = TransferExecutor::new(&native, &sink, None)
        .execute(&request(units(1)), &signature(SignatureVariant::TwoArgTargetAmount))
        .await
        .unwrap();

    assert_eq!(outcome.state, TxState::DispatchError);
    assert!(!outcome.is_success());
    assert_eq!(outcome.error.as_deref(), Some("Revive.TransferFailed"));
    assert_eq!(outcome.emitted_events, failed);
    assert!(sink.events().contains(&BridgeEvent::DispatchFailed {
        error: "Revive.TransferFailed".to_string()
    }));
    assert_eq!(native.unsubscribes(), 1);
}

/// Tests a failed inclusion on a retracted fork followed by a clean finalization.
#[tokio::test]
async fn test_retracted_failure_does_not_outlive_reinclusion() {
    let native = MockNative::new(funded_world(units(5)), None);
    let failed = vec![primitives::ChainEvent::new("System", "ExtrinsicFailed")];
    native.script(Reply::new(
        vec![
            Ok(StatusNotice::Pending),
            in_block(6, failed, Some("Revive.TransferFailed")),
            Ok(StatusNotice::Retracted),
            in_block(7, success_events(), None),
            finalized(7, success_events(), None),
        ],
        Effect::Transfer { fee: U256::zero() },
    ));
    let sink = RecordingSink::new();

    let outcome = TransferExecutor::new(&native, &sink, None)
        .execute(&request(units(1)), &signature(SignatureVariant::TwoArgTargetAmount))
        .await
        .unwrap();

    assert_eq!(outcome.state, TxState::Finalized);
    assert!(outcome.is_success());
    assert_eq!(outcome.error, None);
    assert_eq!(outcome.block_ref, Some(block(7)));
    assert_eq!(outcome.emitted_events, success_events());
    assert!(!sink
        .events()
        .iter()
        .any(|event| matches!(event, BridgeEvent::DispatchFailed { .. })));
}

/// Tests the optimistic call shape used for an unclassified signature.
#[tokio::test]
async fn test_unknown_signature_falls_back_with_warning() {
    let native = MockNative::new(funded_world(units(5)), None);
    native.script(happy(Effect::Transfer { fee: U256::zero() }));
    let sink = RecordingSink::new();
    let unknown = signature(SignatureVariant::Unknown);

    let outcome = TransferExecutor::new(&native, &sink, None)
        .execute(&request(units(1)), &unknown)
        .await
        .unwrap();

    assert!(outcome.signature_fallback);
    assert_eq!(outcome.warnings, vec![FALLBACK_WARNING.to_string()]);
    assert!(sink
        .events()
        .contains(&BridgeEvent::SignatureFallback { signature: unknown }));
    assert!(matches!(
        native.submitted()[0],
        NativeCall::Transfer(TransferCall::TargetAmount { .. })
    ));
}

/// Tests that a native-only shape is never submitted.
#[tokio::test]
async fn test_native_only_is_not_submitted() {
    let native = MockNative::new(funded_world(units(5)), None);
    let sink = RecordingSink::new();

    let err = TransferExecutor::new(&native, &sink, None)
        .execute(&request(units(1)), &signature(SignatureVariant::NativeOnlyTransfer))
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::NativeOnlyTransferSkipped { .. }));
    assert!(native.submitted().is_empty());
}

/// Tests that a call dropped from the pool is rejected, and released once.
#[tokio::test]
async fn test_dropped_submission_is_rejected() {
    let native = MockNative::new(funded_world(units(5)), None);
    native.script(Reply::new(
        vec![
            Ok(StatusNotice::Pending),
            Ok(StatusNotice::Dropped("priority too low".to_string())),
        ],
        Effect::Nothing,
    ));
    let sink = RecordingSink::new();

    let err = TransferExecutor::new(&native, &sink, None)
        .submit_and_wait(NativeCall::ClaimDefaultAccount, "mapping claim")
        .await
        .unwrap_err();

    match err {
        BridgeError::SubmissionRejected { stage, message } => {
            assert_eq!(stage, "mapping claim");
            assert_eq!(message, "priority too low");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(native.unsubscribes(), 1);
}

/// Tests a status stream that ends before any terminal notice.
#[tokio::test]
async fn test_stream_closed_before_finality() {
    let native = MockNative::new(funded_world(units(5)), None);
    native.script(Reply::new(
        vec![in_block(4, success_events(), None)],
        Effect::Nothing,
    ));
    let sink = RecordingSink::new();

    let err = TransferExecutor::new(&native, &sink, None)
        .submit_and_wait(NativeCall::MapAccount, "registration")
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::SubscriptionClosed { .. }));
    assert_eq!(native.unsubscribes(), 1);
}

/// Tests that a transport failure while watching aborts the wait.
#[tokio::test]
async fn test_transport_error_while_watching() {
    let native = MockNative::new(funded_world(units(5)), None);
    native.script(Reply::new(
        vec![
            Ok(StatusNotice::Pending),
            Err(BridgeError::network("watching submission", "socket closed")),
        ],
        Effect::Nothing,
    ));
    let sink = RecordingSink::new();

    let err = TransferExecutor::new(&native, &sink, None)
        .submit_and_wait(NativeCall::MapAccount, "registration")
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Network { .. }));
    assert_eq!(native.unsubscribes(), 1);
}

/// Tests the bounded finality wait.
#[tokio::test]
async fn test_finality_timeout() {
    let native = MockNative::new(funded_world(units(5)), None);
    native.script(Reply::new(vec![in_block(5, success_events(), None)], Effect::Nothing).hanging());
    let sink = RecordingSink::new();
    let limit = Duration::from_millis(50);

    let err = TransferExecutor::new(&native, &sink, Some(limit))
        .submit_and_wait(NativeCall::MapAccount, "registration")
        .await
        .unwrap_err();

    match err {
        BridgeError::FinalityTimeout { stage, waited } => {
            assert_eq!(stage, "registration");
            assert_eq!(waited, limit);
        }
        other => panic!("unexpected error {:?}", other),
    }
    // The abandoned subscription is still released exactly once
    assert_eq!(native.unsubscribes(), 1);
    assert_eq!(states(&sink), vec![TxState::Submitted, TxState::Included]);
}
