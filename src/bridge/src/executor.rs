//! Builds, submits and follows native calls to a terminal state.

use crate::errors::BridgeError;
use crate::events::{BridgeEvent, EventSink};
use crate::ledger::{NativeCall, NativeLedger, StatusNotice, StatusSubscription};
use primitives::units::to_native_balance;
use primitives::{
    format_execution_address, CallSignature, LifecycleTracker, SignatureVariant, TransferCall,
    TransferOutcome, TransferRequest,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Annotation attached to outcomes that rest on the fallback call shape.
pub const FALLBACK_WARNING: &str =
    "unknown transfer signature; submitted with the (H160, Amount) shape";

/// Maps a request onto the argument shape of `signature`.
///
/// Returns the call and whether the shape was guessed.
pub fn build_call(
    request: &TransferRequest,
    signature: &CallSignature,
) -> Result<(TransferCall, bool), BridgeError> {
    let amount = to_native_balance(request.amount_minor_units)?;
    let target = request.target_execution_address;
    match signature.variant {
        SignatureVariant::TwoArgTargetAmount => Ok((TransferCall::TargetAmount { target, amount }, false)),
        SignatureVariant::ThreeArgSourceTargetAmount => Ok((
            TransferCall::SourceTargetAmount {
                source: request.source.native_address.clone(),
                target,
                amount,
            },
            false,
        )),
        SignatureVariant::Unknown => Ok((TransferCall::TargetAmount { target, amount }, true)),
        SignatureVariant::NativeOnlyTransfer => Err(BridgeError::NativeOnlyTransferSkipped {
            signature: signature.to_string(),
        }),
    }
}

/// Submits calls and waits for their terminal state.
pub struct TransferExecutor<'a, L: NativeLedger + ?Sized> {
    ledger: &'a L,
    sink: &'a dyn EventSink,
    finality_timeout: Option<Duration>,
}

impl<'a, L: NativeLedger + ?Sized> TransferExecutor<'a, L> {
    /// Creates an executor. `finality_timeout = None` waits indefinitely.
    pub fn new(ledger: &'a L, sink: &'a dyn EventSink, finality_timeout: Option<Duration>) -> Self {
        Self {
            ledger,
            sink,
            finality_timeout,
        }
    }

    /// Executes a transfer with the shape indicated by `signature`.
    ///
    /// Must not be used for native-only transfers; those fail with
    /// `NativeOnlyTransferSkipped` before anything is submitted.
    pub async fn execute(
        &self,
        request: &TransferRequest,
        signature: &CallSignature,
    ) -> Result<TransferOutcome, BridgeError> {
        let (call, fallback) = build_call(request, signature)?;
        if fallback {
            self.sink.emit(BridgeEvent::SignatureFallback {
                signature: signature.clone(),
            });
        }

        info!(
            "Transferring {} minor units from {} to {} with {}-argument call",
            request.amount_minor_units,
            request.source.native_address,
            format_execution_address(&request.target_execution_address),
            call.arity()
        );

        let stage = format!(
            "transfer of {} to {}",
            request.amount_minor_units,
            format_execution_address(&request.target_execution_address)
        );
        let mut outcome = self.submit_and_wait(NativeCall::Transfer(call), &stage).await?;
        if fallback {
            outcome.signature_fallback = true;
            outcome.warnings.push(FALLBACK_WARNING.to_string());
        }
        Ok(outcome)
    }

    /// Signs and submits `call`, then follows its status until it is terminal.
    pub async fn submit_and_wait(&self, call: NativeCall, stage: &str) -> Result<TransferOutcome, BridgeError> {
        let call_text = call.to_string();
        let subscription = self.ledger.submit(call).await?;
        self.sink.emit(BridgeEvent::TransferSubmitted { call: call_text });

        let wait = wait_for_terminal(subscription, stage, self.sink);
        match self.finality_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| BridgeError::FinalityTimeout {
                    stage: stage.to_string(),
                    waited: limit,
                })?,
            None => wait.await,
        }
    }
}

/// Drives the lifecycle tracker from a status subscription.
///
/// The subscription is released exactly once: explicitly on the terminal
/// notice, or by drop on every error path (including a timeout that cancels
/// this future).
pub async fn wait_for_terminal(
    mut subscription: StatusSubscription,
    stage: &str,
    sink: &dyn EventSink,
) -> Result<TransferOutcome, BridgeError> {
    let mut tracker = LifecycleTracker::new();
    sink.emit(BridgeEvent::StatusChanged {
        state: tracker.state(),
        block: None,
    });

    loop {
        let notice = match subscription.next().await {
            Some(notice) => notice?,
            None => {
                return Err(BridgeError::SubscriptionClosed {
                    stage: stage.to_string(),
                })
            }
        };

        match notice {
            StatusNotice::Pending => debug!("{}: pending", stage),
            StatusNotice::Retracted => warn!("{}: including block retracted", stage),
            StatusNotice::InBlock {
                block,
                events,
                dispatch_error,
            } => {
                let before = tracker.state();
                tracker.observe_in_block(block, events, dispatch_error)?;
                if tracker.state() != before {
                    sink.emit(BridgeEvent::StatusChanged {
                        state: tracker.state(),
                        block: Some(block),
                    });
                }
            }
            StatusNotice::Finalized {
                block,
                events,
                dispatch_error,
            } => {
                let history_before = tracker.history().len();
                let terminal = tracker.observe_finalized(block, events, dispatch_error)?;
                // Report the implicit inclusion when finality arrived first.
                if tracker.history().len() - history_before > 1 {
                    sink.emit(BridgeEvent::StatusChanged {
                        state: primitives::TxState::Included,
                        block: Some(block),
                    });
                }
                sink.emit(BridgeEvent::StatusChanged {
                    state: terminal,
                    block: Some(block),
                });
                subscription.unsubscribe();

                let outcome = tracker.into_outcome();
                if let Some(error) = &outcome.error {
                    sink.emit(BridgeEvent::DispatchFailed { error: error.clone() });
                }
                for event in &outcome.emitted_events {
                    sink.emit(BridgeEvent::EventEmitted { event: event.clone() });
                }
                return Ok(outcome);
            }
            StatusNotice::Dropped(message) | StatusNotice::Invalid(message) => {
                return Err(BridgeError::SubmissionRejected {
                    stage: stage.to_string(),
                    message,
                });
            }
        }
    }
}
