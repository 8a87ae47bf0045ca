//! Operator CLI for the native/execution bridge.

pub mod commands;
pub mod config;
pub mod console;
pub mod errors;

// Re-export commonly used types and functions
pub use commands::{balance, fund, send, signature, summary};
pub use config::BridgeConfig;
pub use errors::CliError;
