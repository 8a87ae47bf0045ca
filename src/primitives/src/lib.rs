//! Primitives for the native/execution ledger bridge.
//!
//! This crate holds the data model shared by the bridge components, the
//! fixed-scale amount conversion, execution address derivation and the
//! submission lifecycle state machine. Nothing here performs I/O.

pub mod address;
pub mod errors;
pub mod lifecycle;
pub mod types;
pub mod units;

// Re-export commonly used types
pub use address::{derive_execution_address, format_execution_address, parse_execution_address};
pub use errors::CoreError;
pub use lifecycle::LifecycleTracker;
pub use types::{
    Account, Anomaly, BalanceSnapshot, CallSignature, ChainEvent, MappingState,
    ReconciliationResult, SignatureVariant, TransferCall, TransferOutcome, TransferRequest,
    TxState, H160, H256, I256, U256,
};
pub use units::{format_amount, format_delta, parse_amount};
