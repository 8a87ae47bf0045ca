//! Error types for the bridge crate.

use primitives::CoreError;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

/// Errors that abort a bridge operation.
///
/// Dispatch errors and no-op transfers are not listed here: they are recorded
/// on the transfer outcome and the reconciliation result instead.
#[derive(Debug)]
pub enum BridgeError {
    /// Error when an RPC transport fails or returns an unusable payload.
    Network { stage: String, message: String },

    /// Error when a JSON-RPC response carries an `error` envelope.
    RpcError { method: String, error: String },

    /// Error when no execution address exists and none could be established.
    MappingMissing { native_address: String, detail: String },

    /// Error when the transfer call does not bridge and was therefore not sent.
    NativeOnlyTransferSkipped { signature: String },

    /// Error when the call was dropped or declared invalid before inclusion.
    SubmissionRejected { stage: String, message: String },

    /// Error when the status stream ended before a terminal notice.
    SubscriptionClosed { stage: String },

    /// Error when finality was not observed within the configured wait.
    FinalityTimeout { stage: String, waited: Duration },

    /// Error when the chain metadata cannot be read.
    Metadata(String),

    /// Error when an address is invalid.
    InvalidAddress(String),

    /// Error when an amount is invalid.
    InvalidAmount(String),

    /// Error when a primitive invariant is violated.
    Core(CoreError),
}

impl BridgeError {
    /// Shorthand for a transport failure at `stage`.
    pub fn network(stage: impl Into<String>, message: impl fmt::Display) -> Self {
        BridgeError::Network {
            stage: stage.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Network { stage, message } => {
                write!(f, "Network error during {}: {}", stage, message)
            }
            BridgeError::RpcError { method, error } => {
                write!(f, "RPC error from {}: {}", method, error)
            }
            BridgeError::MappingMissing { native_address, detail } => write!(
                f,
                "No execution address mapped for {}: {}",
                native_address, detail
            ),
            BridgeError::NativeOnlyTransferSkipped { signature } => write!(
                f,
                "Transfer call {} is a native-only transfer; not a bridging call",
                signature
            ),
            BridgeError::SubmissionRejected { stage, message } => {
                write!(f, "Submission rejected during {}: {}", stage, message)
            }
            BridgeError::SubscriptionClosed { stage } => write!(
                f,
                "Status subscription closed before a terminal notice during {}",
                stage
            ),
            BridgeError::FinalityTimeout { stage, waited } => write!(
                f,
                "No finality notice after {:?} during {}",
                waited, stage
            ),
            BridgeError::Metadata(msg) => write!(f, "Metadata error: {}", msg),
            BridgeError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            BridgeError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            BridgeError::Core(e) => write!(f, "Core error: {}", e),
        }
    }
}

impl StdError for BridgeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BridgeError::Core(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CoreError> for BridgeError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::InvalidAmount { .. } => BridgeError::InvalidAmount(error.to_string()),
            CoreError::InvalidAddress(_) => BridgeError::InvalidAddress(error.to_string()),
            other => BridgeError::Core(other),
        }
    }
}
