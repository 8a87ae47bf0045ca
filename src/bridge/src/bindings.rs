//! Contract bindings for the execution layer.

use crate::errors::BridgeError;
use ethers::{
    abi::{parse_abi, Abi},
    prelude::*,
};
use std::sync::Arc;

/// Human-readable ABI of the token view.
const TOKEN_VIEW_ABI: &[&str] = &["function balanceOf(address) view returns (uint256)"];

/// The ERC-20 compatible view of the native asset.
pub struct NativeTokenView<M: Middleware> {
    contract: Contract<M>,
}

impl<M: Middleware> NativeTokenView<M> {
    /// Binds the view at `address`.
    pub fn new(address: Address, client: Arc<M>) -> Result<Self, BridgeError> {
        let abi: Abi = parse_abi(TOKEN_VIEW_ABI)
            .map_err(|e| BridgeError::Metadata(format!("Invalid token view ABI: {}", e)))?;
        let contract = Contract::new(address, abi, client);
        Ok(Self { contract })
    }

    /// Balance of `holder` as reported by the view.
    pub fn balance_of(&self, holder: Address) -> Result<ContractCall<M, U256>, BridgeError> {
        self.contract
            .method("balanceOf", (holder,))
            .map_err(|e| BridgeError::Metadata(format!("balanceOf not callable: {}", e)))
    }
}
