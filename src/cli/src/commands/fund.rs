//! Fund command: move native funds into the signer's own execution account.

use super::connect;
use crate::config::BridgeConfig;
use crate::errors::CliError;
use bridge::{BridgeError, MappingStrategy, TransferReport};
use primitives::{format_amount, parse_amount};
use tracing::info;

/// Runs the fund command with `amount`, or the configured demo amount.
pub async fn run(
    config: &BridgeConfig,
    strategy: MappingStrategy,
    amount: Option<&str>,
    json: bool,
) -> Result<TransferReport, CliError> {
    let amount = parse_amount(amount.unwrap_or(&config.demo_amount)).map_err(BridgeError::from)?;
    let (session, signer) = connect(config, json).await?;

    info!(
        "Funding execution account of {} with {}",
        signer.native_address,
        format_amount(amount)
    );
    let (_, report) = session.fund_own_account(signer, strategy, amount).await?;
    Ok(report)
}
