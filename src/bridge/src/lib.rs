//! Bridge between a native balance ledger and its Ethereum-compatible
//! execution layer.
//!
//! The session in [`session`] drives the flow; the ledgers are reached
//! through the traits in [`ledger`], implemented for a Substrate node in
//! [`substrate`] and for an Ethereum JSON-RPC endpoint in [`evm_rpc`].

pub mod bindings;
pub mod errors;
pub mod events;
pub mod evm_rpc;
pub mod executor;
pub mod inspector;
pub mod ledger;
pub mod mapper;
pub mod oracle;
pub mod reconcile;
pub mod session;
pub mod substrate;

pub use errors::BridgeError;
pub use events::{BridgeEvent, EventSink, RecordingSink, TracingSink};
pub use evm_rpc::EthRpcClient;
pub use executor::{TransferExecutor, FALLBACK_WARNING};
pub use ledger::{
    ArgMetadata, CallMetadata, ExecutionLedger, NativeAccountInfo, NativeCall, NativeLedger,
    StatusNotice, StatusSubscription,
};
pub use mapper::{AccountMapper, MappingStrategy};
pub use oracle::BalanceOracle;
pub use reconcile::reconcile;
pub use session::{AddressSummary, BridgeSession, SessionConfig, TransferReport, NATIVE_TOKEN_VIEW};
pub use substrate::SubstrateLedger;
