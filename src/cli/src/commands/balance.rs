//! Balance command for any native address.

use super::connect;
use crate::config::BridgeConfig;
use crate::errors::CliError;
use bridge::NativeAccountInfo;
use tracing::debug;

/// Runs the balance command for `address`, or the signer when absent.
pub async fn run(
    config: &BridgeConfig,
    address: Option<&str>,
    json: bool,
) -> Result<(String, NativeAccountInfo), CliError> {
    let (session, signer) = connect(config, json).await?;
    let address = address
        .map(str::to_string)
        .unwrap_or(signer.native_address);
    debug!("Getting native balance for {}", address);

    let info = session.native_balance(&address).await?;
    Ok((address, info))
}
