//! Correspondence between native accounts and execution addresses.

use crate::errors::BridgeError;
use crate::events::{BridgeEvent, EventSink};
use crate::executor::TransferExecutor;
use crate::ledger::{NativeCall, NativeLedger};
use primitives::{derive_execution_address, Account, MappingState, H160};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// How an account obtains its execution address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingStrategy {
    /// Claim the default execution account on chain and read it back.
    Claim,
    /// Keccak-256 of the public key, no chain interaction.
    Derive,
    /// Register the derived address on chain, then use the derivation.
    MapAndDerive,
}

impl FromStr for MappingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "claim" => Ok(MappingStrategy::Claim),
            "derive" => Ok(MappingStrategy::Derive),
            "map" | "map-and-derive" => Ok(MappingStrategy::MapAndDerive),
            other => Err(format!(
                "unknown mapping strategy '{}' (expected claim, derive or map)",
                other
            )),
        }
    }
}

/// Establishes and looks up account mappings.
pub struct AccountMapper<'a, L: NativeLedger + ?Sized> {
    ledger: &'a L,
    sink: &'a dyn EventSink,
    finality_timeout: Option<Duration>,
}

impl<'a, L: NativeLedger + ?Sized> AccountMapper<'a, L> {
    pub fn new(ledger: &'a L, sink: &'a dyn EventSink, finality_timeout: Option<Duration>) -> Self {
        Self {
            ledger,
            sink,
            finality_timeout,
        }
    }

    /// Makes sure `account` has an execution address. Idempotent: an account
    /// that is already mapped is returned unchanged.
    pub async fn ensure_mapped(
        &self,
        mut account: Account,
        strategy: MappingStrategy,
    ) -> Result<Account, BridgeError> {
        if account.is_mapped() {
            debug!("{} already mapped", account.native_address);
            return Ok(account);
        }

        let (address, state) = match strategy {
            MappingStrategy::Derive => (derive_execution_address(&account.public_key), MappingState::Derived),
            MappingStrategy::Claim => (self.claim(&account).await?, MappingState::Claimed),
            MappingStrategy::MapAndDerive => (self.map_and_derive(&account).await?, MappingState::Derived),
        };

        account.record_mapping(address, state)?;
        self.sink.emit(BridgeEvent::MappingEstablished {
            native_address: account.native_address.clone(),
            execution_address: address,
            state,
        });
        Ok(account)
    }

    /// Native account registered for `address`, or `None` when unmapped.
    pub async fn reverse_lookup(&self, address: H160) -> Result<Option<String>, BridgeError> {
        self.ledger.original_account(address).await
    }

    async fn claim(&self, account: &Account) -> Result<H160, BridgeError> {
        if let Some(existing) = self.ledger.evm_address_of(&account.native_address).await? {
            debug!("{} has a claimed address already", account.native_address);
            return Ok(existing);
        }

        self.sink.emit(BridgeEvent::MappingClaimSubmitted {
            native_address: account.native_address.clone(),
        });
        let stage = format!("mapping claim for {}", account.native_address);
        let outcome = self
            .executor()
            .submit_and_wait(NativeCall::ClaimDefaultAccount, &stage)
            .await?;

        match self.ledger.evm_address_of(&account.native_address).await? {
            Some(address) => Ok(address),
            None => Err(BridgeError::MappingMissing {
                native_address: account.native_address.clone(),
                detail: match outcome.error {
                    Some(error) => format!("claim rejected: {}", error),
                    None => "claim finalized but no address is stored".to_string(),
                },
            }),
        }
    }

    async fn map_and_derive(&self, account: &Account) -> Result<H160, BridgeError> {
        let derived = derive_execution_address(&account.public_key);
        if self.ledger.original_account(derived).await?.is_some() {
            debug!("{} is registered already", account.native_address);
            return Ok(derived);
        }

        self.sink.emit(BridgeEvent::MappingClaimSubmitted {
            native_address: account.native_address.clone(),
        });
        let stage = format!("account registration for {}", account.native_address);
        let outcome = self.executor().submit_and_wait(NativeCall::MapAccount, &stage).await?;
        if let Some(error) = outcome.error {
            warn!(
                "Registration of {} was rejected ({}); continuing with the derived address",
                account.native_address, error
            );
        }
        Ok(derived)
    }

    fn executor(&self) -> TransferExecutor<'_, L> {
        TransferExecutor::new(self.ledger, self.sink, self.finality_timeout)
    }
}
