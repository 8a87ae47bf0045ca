//! One operator session against a native ledger and its execution layer.
//!
//! Flow for a transfer: map the account, snapshot, resolve the call shape
//! (once per session), submit and wait for finality, snapshot again and
//! reconcile. Everything runs sequentially; the only suspension on an external
//! event stream is the executor's wait for a terminal status.

use crate::errors::BridgeError;
use crate::events::{BridgeEvent, EventSink};
use crate::executor::TransferExecutor;
use crate::inspector;
use crate::ledger::{ExecutionLedger, NativeAccountInfo, NativeLedger};
use crate::mapper::{AccountMapper, MappingStrategy};
use crate::oracle::BalanceOracle;
use crate::reconcile::reconcile;
use primitives::{
    parse_execution_address, Account, Anomaly, BalanceSnapshot, CallSignature,
    ReconciliationResult, TransferOutcome, TransferRequest, H160, U256,
};
use serde::Serialize;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

/// ERC-20 view of the native asset on the execution layer.
pub const NATIVE_TOKEN_VIEW: &str = "0x0000000000000000000000000000000001000000";

/// Resolved settings of a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pallet exposing the transfer call
    pub transfer_pallet: String,
    /// Name of the transfer call
    pub transfer_call: String,
    /// Token-view contract, if balances should also be read through it
    pub token_view: Option<H160>,
    /// Upper bound on the finality wait; `None` waits indefinitely
    pub finality_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transfer_pallet: "Revive".to_string(),
            transfer_call: "transfer".to_string(),
            token_view: parse_execution_address(NATIVE_TOKEN_VIEW).ok(),
            finality_timeout: None,
        }
    }
}

/// What happened to a transfer request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferReport {
    /// The call does not bridge; nothing was submitted.
    Skipped {
        signature: CallSignature,
        before: BalanceSnapshot,
    },
    /// The call was submitted and followed to a terminal state.
    Completed {
        signature: CallSignature,
        outcome: TransferOutcome,
        reconciliation: ReconciliationResult,
    },
}

impl TransferReport {
    pub fn anomaly(&self) -> Option<Anomaly> {
        match self {
            TransferReport::Skipped { .. } => None,
            TransferReport::Completed { reconciliation, .. } => reconciliation.anomaly,
        }
    }
}

/// Balances and mappings of one account.
#[derive(Debug, Clone, Serialize)]
pub struct AddressSummary {
    pub account: Account,
    pub native_free: U256,
    pub native_reserved: U256,
    pub nonce: u64,
    pub execution_raw_balance: U256,
    pub execution_token_balance: Option<U256>,
    /// Native account registered for the execution address
    pub reverse_mapping: Option<String>,
    /// `MappingMissing` when the reverse mapping is empty
    pub anomaly: Option<Anomaly>,
}

pub struct BridgeSession<N: NativeLedger, E: ExecutionLedger> {
    native: N,
    execution: E,
    config: SessionConfig,
    sink: Arc<dyn EventSink>,
    signature: OnceCell<CallSignature>,
    clock: AtomicU64,
}

impl<N: NativeLedger, E: ExecutionLedger> BridgeSession<N, E> {
    pub fn new(native: N, execution: E, config: SessionConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            native,
            execution,
            config,
            sink,
            signature: OnceCell::new(),
            clock: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    /// Queries and reports the chain identity.
    pub async fn chain_name(&self) -> Result<String, BridgeError> {
        let chain = self.native.chain_name().await?;
        self.sink.emit(BridgeEvent::Connected { chain: chain.clone() });
        Ok(chain)
    }

    /// Shape of the transfer call, resolved on first use and cached.
    pub async fn signature(&self) -> Result<&CallSignature, BridgeError> {
        self.signature
            .get_or_try_init(|| async {
                let metadata = self
                    .native
                    .call_metadata(&self.config.transfer_pallet, &self.config.transfer_call)
                    .await?;
                let signature = match metadata {
                    Some(metadata) => inspector::resolve(&metadata),
                    None => inspector::unresolved(),
                };
                self.sink.emit(BridgeEvent::SignatureResolved {
                    signature: signature.clone(),
                });
                Ok::<_, BridgeError>(signature)
            })
            .await
    }

    pub async fn ensure_mapped(&self, account: Account, strategy: MappingStrategy) -> Result<Account, BridgeError> {
        self.mapper().ensure_mapped(account, strategy).await
    }

    pub async fn reverse_lookup(&self, address: H160) -> Result<Option<String>, BridgeError> {
        self.mapper().reverse_lookup(address).await
    }

    /// Account record of any native address.
    pub async fn native_balance(&self, native_address: &str) -> Result<NativeAccountInfo, BridgeError> {
        self.native.account_info(native_address).await
    }

    pub async fn snapshot(&self, native_address: &str, execution_address: H160) -> Result<BalanceSnapshot, BridgeError> {
        self.oracle().snapshot(native_address, execution_address).await
    }

    /// Sends the signer's funds to its own execution address.
    pub async fn fund_own_account(
        &self,
        account: Account,
        strategy: MappingStrategy,
        amount: U256,
    ) -> Result<(Account, TransferReport), BridgeError> {
        let account = self.ensure_mapped(account, strategy).await?;
        let target = account
            .execution_address
            .ok_or_else(|| BridgeError::MappingMissing {
                native_address: account.native_address.clone(),
                detail: "mapping did not yield an address".to_string(),
            })?;
        let report = self.transfer(account.clone(), target, amount).await?;
        Ok((account, report))
    }

    /// Maps the sender, then sends to an arbitrary execution address.
    pub async fn send_to(
        &self,
        account: Account,
        strategy: MappingStrategy,
        target: H160,
        amount: U256,
    ) -> Result<(Account, TransferReport), BridgeError> {
        let account = self.ensure_mapped(account, strategy).await?;
        let report = self.transfer(account.clone(), target, amount).await?;
        Ok((account, report))
    }

    /// Snapshot, submit, snapshot, reconcile.
    pub async fn transfer(&self, source: Account, target: H160, amount: U256) -> Result<TransferReport, BridgeError> {
        if !source.is_mapped() {
            return Err(BridgeError::MappingMissing {
                native_address: source.native_address.clone(),
                detail: "transfer requested before the account was mapped".to_string(),
            });
        }

        let request = TransferRequest {
            source,
            target_execution_address: target,
            amount_minor_units: amount,
        };
        let oracle = self.oracle();

        let before = oracle.snapshot(&request.source.native_address, target).await?;
        self.sink.emit(BridgeEvent::SnapshotTaken {
            label: "before",
            snapshot: before.clone(),
        });

        let signature = self.signature().await?.clone();
        if !signature.is_bridging() {
            self.sink.emit(BridgeEvent::TransferSkipped {
                signature: signature.clone(),
            });
            return Ok(TransferReport::Skipped { signature, before });
        }

        let outcome = self.executor().execute(&request, &signature).await?;
        info!("Transfer reached {:?}", outcome.state);

        let after = oracle.snapshot(&request.source.native_address, target).await?;
        self.sink.emit(BridgeEvent::SnapshotTaken {
            label: "after",
            snapshot: after.clone(),
        });

        let reconciliation = reconcile(before, after, Some(&outcome));
        if let Some(anomaly) = reconciliation.anomaly {
            self.sink.emit(BridgeEvent::AnomalyDetected { anomaly });
        }
        Ok(TransferReport::Completed {
            signature,
            outcome,
            reconciliation,
        })
    }

    /// Maps the account and reports its balances on both ledgers together
    /// with the reverse mapping of its execution address.
    pub async fn address_summary(&self, account: Account, strategy: MappingStrategy) -> Result<AddressSummary, BridgeError> {
        let account = self.ensure_mapped(account, strategy).await?;
        let execution_address = account
            .execution_address
            .ok_or_else(|| BridgeError::MappingMissing {
                native_address: account.native_address.clone(),
                detail: "mapping did not yield an address".to_string(),
            })?;

        let info = self.native.account_info(&account.native_address).await?;
        let snapshot = self.oracle().snapshot(&account.native_address, execution_address).await?;
        let reverse_mapping = self.reverse_lookup(execution_address).await?;
        let anomaly = match reverse_mapping {
            Some(_) => None,
            None => {
                self.sink.emit(BridgeEvent::AnomalyDetected {
                    anomaly: Anomaly::MappingMissing,
                });
                Some(Anomaly::MappingMissing)
            }
        };

        Ok(AddressSummary {
            account,
            native_free: info.free,
            native_reserved: info.reserved,
            nonce: info.nonce,
            execution_raw_balance: snapshot.execution_raw_balance,
            execution_token_balance: snapshot.execution_token_balance,
            reverse_mapping,
            anomaly,
        })
    }

    fn mapper(&self) -> AccountMapper<'_, N> {
        AccountMapper::new(&self.native, self.sink.as_ref(), self.config.finality_timeout)
    }

    fn executor(&self) -> TransferExecutor<'_, N> {
        TransferExecutor::new(&self.native, self.sink.as_ref(), self.config.finality_timeout)
    }

    fn oracle(&self) -> BalanceOracle<'_, N, E> {
        BalanceOracle::new(
            &self.native,
            &self.execution,
            self.config.token_view,
            self.sink.as_ref(),
            &self.clock,
        )
    }
}
