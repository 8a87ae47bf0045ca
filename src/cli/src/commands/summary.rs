//! Summary command: balances and mappings of the signing account.

use super::connect;
use crate::config::BridgeConfig;
use crate::errors::CliError;
use bridge::{AddressSummary, MappingStrategy};

/// Runs the summary command.
pub async fn run(
    config: &BridgeConfig,
    strategy: MappingStrategy,
    json: bool,
) -> Result<AddressSummary, CliError> {
    let (session, signer) = connect(config, json).await?;
    Ok(session.address_summary(signer, strategy).await?)
}
