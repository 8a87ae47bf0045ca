//! Signature command: show how the transfer call is classified.

use super::connect;
use crate::config::BridgeConfig;
use crate::errors::CliError;
use primitives::CallSignature;

pub async fn run(config: &BridgeConfig, json: bool) -> Result<CallSignature, CliError> {
    let (session, _) = connect(config, json).await?;
    Ok(session.signature().await?.clone())
}
