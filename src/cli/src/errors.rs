//! Error types for the bridge CLI.

use bridge::BridgeError;
use std::error::Error as StdError;
use std::fmt;

/// Errors that can occur in the bridge CLI.
#[derive(Debug)]
pub enum CliError {
    /// Error when a file operation fails.
    FileError(std::io::Error),

    /// Error when JSON serialization or deserialization fails.
    JsonError(serde_json::Error),

    /// Error when a configuration value cannot be used.
    ConfigError(String),

    /// Error raised by the bridge itself.
    BridgeError(BridgeError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::FileError(e) => write!(f, "File error: {}", e),
            CliError::JsonError(e) => write!(f, "JSON error: {}", e),
            CliError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            CliError::BridgeError(e) => write!(f, "{}", e),
        }
    }
}

impl StdError for CliError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            CliError::FileError(e) => Some(e),
            CliError::JsonError(e) => Some(e),
            CliError::BridgeError(e) => Some(e),
            CliError::ConfigError(_) => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::FileError(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        CliError::JsonError(error)
    }
}

impl From<BridgeError> for CliError {
    fn from(error: BridgeError) -> Self {
        CliError::BridgeError(error)
    }
}
