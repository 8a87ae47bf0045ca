//! Seams to the two ledgers.
//!
//! The bridge components only talk to the chains through these traits, so the
//! engine can be driven against live nodes or against in-memory doubles.

use crate::errors::BridgeError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use primitives::{ChainEvent, TransferCall, H160, H256, U256};
use std::fmt;

/// One declared argument of a runtime call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgMetadata {
    pub name: String,
    pub type_name: String,
}

impl ArgMetadata {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Published metadata of one runtime call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallMetadata {
    pub args: Vec<ArgMetadata>,
}

/// Account record of the native ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NativeAccountInfo {
    pub free: U256,
    pub reserved: U256,
    pub nonce: u64,
}

/// Calls the bridge submits to the native ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NativeCall {
    /// Claim the signer's default execution account.
    ClaimDefaultAccount,
    /// Register the signer's derived execution address.
    MapAccount,
    /// Move value into the execution layer.
    Transfer(TransferCall),
}

impl fmt::Display for NativeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeCall::ClaimDefaultAccount => write!(f, "claim_default_account()"),
            NativeCall::MapAccount => write!(f, "map_account()"),
            NativeCall::Transfer(TransferCall::TargetAmount { target, amount }) => {
                write!(f, "transfer({:?}, {})", target, amount)
            }
            NativeCall::Transfer(TransferCall::SourceTargetAmount { source, target, amount }) => {
                write!(f, "transfer({}, {:?}, {})", source, target, amount)
            }
        }
    }
}

/// A status notice for a submitted call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusNotice {
    /// Accepted into the pool or broadcast; informational.
    Pending,
    InBlock {
        block: H256,
        events: Vec<ChainEvent>,
        dispatch_error: Option<String>,
    },
    /// The including block left the best chain.
    Retracted,
    Finalized {
        block: H256,
        events: Vec<ChainEvent>,
        dispatch_error: Option<String>,
    },
    Dropped(String),
    Invalid(String),
}

type UnsubscribeHook = Box<dyn FnOnce() + Send>;

/// A live status subscription.
///
/// The unsubscribe hook runs exactly once: when `unsubscribe` is called, or
/// when the subscription is dropped without having been unsubscribed.
pub struct StatusSubscription {
    notices: BoxStream<'static, Result<StatusNotice, BridgeError>>,
    unsubscribe: Option<UnsubscribeHook>,
}

impl StatusSubscription {
    pub fn new(notices: BoxStream<'static, Result<StatusNotice, BridgeError>>) -> Self {
        Self {
            notices,
            unsubscribe: None,
        }
    }

    /// Attaches the action that tears the subscription down on the node.
    pub fn with_unsubscribe(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.unsubscribe = Some(Box::new(hook));
        self
    }

    /// Next notice, or `None` once the stream is exhausted.
    pub async fn next(&mut self) -> Option<Result<StatusNotice, BridgeError>> {
        use futures::StreamExt;
        self.notices.next().await
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(hook) = self.unsubscribe.take() {
            hook();
        }
    }
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for StatusSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusSubscription")
            .field("subscribed", &self.unsubscribe.is_some())
            .finish()
    }
}

/// The native ledger: balances, mapping storage and call submission.
#[async_trait]
pub trait NativeLedger: Send + Sync {
    /// Human-readable chain name.
    async fn chain_name(&self) -> Result<String, BridgeError>;

    /// Metadata of `pallet.call`, or `None` when the runtime does not expose it.
    async fn call_metadata(&self, pallet: &str, call: &str) -> Result<Option<CallMetadata>, BridgeError>;

    /// Account record of an SS58 address.
    async fn account_info(&self, native_address: &str) -> Result<NativeAccountInfo, BridgeError>;

    /// Execution address claimed by the account, if any.
    async fn evm_address_of(&self, native_address: &str) -> Result<Option<H160>, BridgeError>;

    /// Native account registered for an execution address, if any.
    async fn original_account(&self, address: H160) -> Result<Option<String>, BridgeError>;

    /// Signs `call` with the session signer, submits it and subscribes to its status.
    async fn submit(&self, call: NativeCall) -> Result<StatusSubscription, BridgeError>;
}

/// The execution layer's JSON-RPC surface.
#[async_trait]
pub trait ExecutionLedger: Send + Sync {
    /// `eth_getBalance(address, "latest")`.
    async fn balance(&self, address: H160) -> Result<U256, BridgeError>;

    /// `balanceOf(holder)` on a token-view contract.
    async fn token_balance(&self, contract: H160, holder: H160) -> Result<U256, BridgeError>;
}
