//! Error types for the primitives crate.

use crate::types::TxState;
use thiserror::Error;

/// Errors that can occur while building or validating bridge primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Error when a decimal amount cannot be converted to minor units.
    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount {
        /// The rejected input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// Error when an execution-layer address is malformed.
    #[error("Invalid execution address '{0}': expected 0x followed by 40 hex digits")]
    InvalidAddress(String),

    /// Error when a status notice would move the lifecycle backwards or past a terminal state.
    #[error("Illegal lifecycle transition: {notice} observed in state {from:?}")]
    IllegalTransition {
        /// The state the tracker was in
        from: TxState,
        /// The notice that was rejected
        notice: &'static str,
    },

    /// Error when an account is assigned a second, different execution address.
    #[error("Account {native_address} is already mapped to {existing}, refusing {proposed}")]
    MappingConflict {
        /// The native account
        native_address: String,
        /// The address recorded earlier in the session
        existing: String,
        /// The address that was rejected
        proposed: String,
    },
}
