//! Before/after comparison of a transfer.

use primitives::units::signed_delta;
use primitives::{Anomaly, BalanceSnapshot, ReconciliationResult, TransferOutcome, I256};

/// Compares two snapshots of the same account pair.
///
/// `outcome` is the transfer that ran between them, if any. A transfer that
/// finalized without a dispatch error while the execution balance did not
/// move is flagged as `NoOpTransfer`; a transfer sent with a guessed call
/// shape is flagged as `SignatureUnresolved`.
pub fn reconcile(
    before: BalanceSnapshot,
    after: BalanceSnapshot,
    outcome: Option<&TransferOutcome>,
) -> ReconciliationResult {
    let native_delta = signed_delta(before.native_free, after.native_free);
    let execution_delta = signed_delta(before.execution_raw_balance, after.execution_raw_balance);

    let anomaly = outcome.and_then(|outcome| {
        if outcome.is_success() && execution_delta == I256::zero() {
            Some(Anomaly::NoOpTransfer)
        } else if outcome.signature_fallback {
            Some(Anomaly::SignatureUnresolved)
        } else {
            None
        }
    });

    ReconciliationResult {
        before,
        after,
        native_delta,
        execution_delta,
        anomaly,
    }
}
