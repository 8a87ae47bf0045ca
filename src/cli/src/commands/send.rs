//! Send command: transfer to an arbitrary execution address.

use super::connect;
use crate::config::BridgeConfig;
use crate::errors::CliError;
use bridge::{BridgeError, MappingStrategy, TransferReport};
use primitives::{format_amount, parse_amount, parse_execution_address};
use tracing::info;

/// Runs the send command.
///
/// Arguments are validated before any connection is opened.
pub async fn run(
    config: &BridgeConfig,
    strategy: MappingStrategy,
    to: &str,
    amount: &str,
    json: bool,
) -> Result<TransferReport, CliError> {
    let target = parse_execution_address(to).map_err(BridgeError::from)?;
    let amount = parse_amount(amount).map_err(BridgeError::from)?;
    let (session, signer) = connect(config, json).await?;

    info!("Sending {} to {}", format_amount(amount), to);
    let (_, report) = session.send_to(signer, strategy, target, amount).await?;
    Ok(report)
}
