//! Commands for the bridge CLI.

pub mod balance;
pub mod fund;
pub mod send;
pub mod signature;
pub mod summary;

use crate::config::BridgeConfig;
use crate::console::ConsoleSink;
use crate::errors::CliError;
use bridge::{BridgeSession, EthRpcClient, EventSink, SubstrateLedger, TracingSink};
use primitives::Account;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Session against live endpoints.
pub type LiveSession = BridgeSession<SubstrateLedger, EthRpcClient>;

/// Connects both ledgers and reports the chain identity.
///
/// Returns the session together with the (unmapped) signing account.
pub async fn connect(config: &BridgeConfig, json: bool) -> Result<(LiveSession, Account), CliError> {
    let session_config = config.session_config()?;
    info!(
        "Connecting to {} and {}",
        config.native_endpoint, config.execution_endpoint
    );

    let native = SubstrateLedger::connect(
        &config.native_endpoint,
        &config.signer_uri,
        &config.transfer_pallet,
        &config.transfer_call,
    )
    .await?;
    let execution = EthRpcClient::new(&config.execution_endpoint)?;
    let signer = native.signer_account();

    let sink: Arc<dyn EventSink> = if json {
        Arc::new(TracingSink)
    } else {
        Arc::new(ConsoleSink)
    };
    let session = BridgeSession::new(native, execution, session_config, sink);
    session.chain_name().await?;
    Ok((session, signer))
}

/// Writes `value` as JSON, or through `render` on the console.
pub fn output<T: Serialize>(json: bool, value: &T, render: impl FnOnce(&T)) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        render(value);
    }
    Ok(())
}
