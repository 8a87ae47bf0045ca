//! Balance snapshots across both ledgers.

use crate::errors::BridgeError;
use crate::events::{BridgeEvent, EventSink};
use crate::ledger::{ExecutionLedger, NativeLedger};
use primitives::{format_execution_address, BalanceSnapshot, H160};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Reads native and execution-layer balances of an account pair.
pub struct BalanceOracle<'a, N: NativeLedger + ?Sized, E: ExecutionLedger + ?Sized> {
    native: &'a N,
    execution: &'a E,
    token_view: Option<H160>,
    sink: &'a dyn EventSink,
    clock: &'a AtomicU64,
}

impl<'a, N: NativeLedger + ?Sized, E: ExecutionLedger + ?Sized> BalanceOracle<'a, N, E> {
    /// `clock` orders snapshots; share one clock across oracles of a session.
    pub fn new(
        native: &'a N,
        execution: &'a E,
        token_view: Option<H160>,
        sink: &'a dyn EventSink,
        clock: &'a AtomicU64,
    ) -> Self {
        Self {
            native,
            execution,
            token_view,
            sink,
            clock,
        }
    }

    /// Takes a snapshot. The native and raw execution reads are mandatory; the
    /// token-view read is best effort and is left empty when it fails.
    pub async fn snapshot(
        &self,
        native_address: &str,
        execution_address: H160,
    ) -> Result<BalanceSnapshot, BridgeError> {
        let native_free = self
            .native
            .account_info(native_address)
            .await
            .map_err(|e| with_stage(e, &format!("native balance of {}", native_address)))?
            .free;

        let execution_raw_balance = self.execution.balance(execution_address).await.map_err(|e| {
            with_stage(
                e,
                &format!("execution balance of {}", format_execution_address(&execution_address)),
            )
        })?;

        let execution_token_balance = match self.token_view {
            Some(contract) => match self.execution.token_balance(contract, execution_address).await {
                Ok(balance) => Some(balance),
                Err(e) => {
                    self.sink.emit(BridgeEvent::TokenViewUnavailable { reason: e.to_string() });
                    None
                }
            },
            None => None,
        };

        let taken_at = self.clock.fetch_add(1, Ordering::SeqCst);
        debug!("Snapshot #{} for {}", taken_at, native_address);
        Ok(BalanceSnapshot {
            native_free,
            execution_raw_balance,
            execution_token_balance,
            taken_at,
        })
    }
}

/// Prefixes transport failures with the read that caused them.
fn with_stage(error: BridgeError, stage: &str) -> BridgeError {
    match error {
        BridgeError::Network { stage: inner, message } => BridgeError::Network {
            stage: format!("{} ({})", stage, inner),
            message,
        },
        BridgeError::RpcError { method, error } => BridgeError::Network {
            stage: stage.to_string(),
            message: format!("{} returned {}", method, error),
        },
        other => other,
    }
}
