//! Data model shared by every bridge component.

use crate::errors::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use ethers::types::{H160, H256, I256, U256};

/// A native account identifier (32-byte public key).
pub type PublicKey = [u8; 32];

/// Monotonic counter used to order balance snapshots within one run.
pub type LogicalTime = u64;

/// The argument shapes the transfer call has exposed across runtime versions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureVariant {
    /// `transfer(target: H160, amount)`
    TwoArgTargetAmount,
    /// `transfer(source: AccountId, target: H160, amount)`
    ThreeArgSourceTargetAmount,
    /// `transfer(dest: AccountId, amount)`, which does not bridge.
    NativeOnlyTransfer,
    /// Anything else.
    Unknown,
}

/// Classified argument shape of the transfer call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSignature {
    /// The classification
    pub variant: SignatureVariant,
    /// Declared argument names, in order
    pub arg_names: Vec<String>,
    /// Declared argument type descriptors, in order
    pub arg_type_hints: Vec<String>,
}

impl CallSignature {
    /// Returns true when calling the transfer moves value into the execution layer.
    pub fn is_bridging(&self) -> bool {
        self.variant != SignatureVariant::NativeOnlyTransfer
    }

    /// Returns true when the shape was recognised rather than guessed.
    pub fn is_resolved(&self) -> bool {
        self.variant != SignatureVariant::Unknown
    }
}

impl fmt::Display for CallSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self
            .arg_names
            .iter()
            .zip(self.arg_type_hints.iter())
            .map(|(name, ty)| format!("{}: {}", name, ty))
            .collect();
        write!(f, "{:?}({})", self.variant, args.join(", "))
    }
}

/// How an account obtained its execution-layer address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingState {
    Unmapped,
    Claimed,
    Derived,
}

/// A native account and, once known, its execution-layer address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// SS58 encoded native address
    pub native_address: String,
    /// Raw public key
    #[serde(with = "hex_key")]
    pub public_key: PublicKey,
    /// 20-byte execution-layer address, set at most once per run
    pub execution_address: Option<H160>,
    /// How `execution_address` was obtained
    pub mapping_state: MappingState,
}

impl Account {
    /// Creates an unmapped account.
    pub fn new(native_address: impl Into<String>, public_key: PublicKey) -> Self {
        Self {
            native_address: native_address.into(),
            public_key,
            execution_address: None,
            mapping_state: MappingState::Unmapped,
        }
    }

    /// Returns true once an execution address has been recorded.
    pub fn is_mapped(&self) -> bool {
        self.execution_address.is_some()
    }

    /// Records the execution address.
    ///
    /// Recording the same address again is a no-op; recording a different one
    /// is refused, since the mapping is stable for the rest of the session.
    pub fn record_mapping(&mut self, address: H160, state: MappingState) -> Result<(), CoreError> {
        match self.execution_address {
            Some(existing) if existing == address => Ok(()),
            Some(existing) => Err(CoreError::MappingConflict {
                native_address: self.native_address.clone(),
                existing: format!("{:?}", existing),
                proposed: format!("{:?}", address),
            }),
            None => {
                self.execution_address = Some(address);
                self.mapping_state = state;
                Ok(())
            }
        }
    }
}

/// A request to move value from a native account to an execution address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// The signing account
    pub source: Account,
    /// The receiving execution-layer address
    pub target_execution_address: H160,
    /// Amount in minor units (18 decimals)
    pub amount_minor_units: U256,
}

/// The transfer call, built for one concrete argument shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferCall {
    TargetAmount {
        target: H160,
        amount: u128,
    },
    SourceTargetAmount {
        source: String,
        target: H160,
        amount: u128,
    },
}

impl TransferCall {
    /// Number of arguments the call carries.
    pub fn arity(&self) -> usize {
        match self {
            TransferCall::TargetAmount { .. } => 2,
            TransferCall::SourceTargetAmount { .. } => 3,
        }
    }

    pub fn target(&self) -> H160 {
        match self {
            TransferCall::TargetAmount { target, .. } => *target,
            TransferCall::SourceTargetAmount { target, .. } => *target,
        }
    }
}

/// An event emitted by an extrinsic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEvent {
    pub pallet: String,
    pub variant: String,
}

impl ChainEvent {
    pub fn new(pallet: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            pallet: pallet.into(),
            variant: variant.into(),
        }
    }
}

impl fmt::Display for ChainEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pallet, self.variant)
    }
}

/// Lifecycle state of a submitted call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TxState {
    Submitted,
    Included,
    Finalized,
    /// Finalized, but the runtime rejected the dispatch.
    DispatchError,
}

impl TxState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TxState::Finalized | TxState::DispatchError)
    }
}

/// Result of one submitted call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Terminal (or last observed) state
    pub state: TxState,
    /// Block that finalized the call
    pub block_ref: Option<H256>,
    /// Events emitted by the call, in order
    pub emitted_events: Vec<ChainEvent>,
    /// Dispatch-level rejection, if any
    pub error: Option<String>,
    /// Non-fatal annotations raised while building or submitting the call
    pub warnings: Vec<String>,
    /// True when the call shape was not recognised and the two-argument shape was assumed
    pub signature_fallback: bool,
}

impl TransferOutcome {
    /// Finalized without a dispatch error.
    pub fn is_success(&self) -> bool {
        self.state == TxState::Finalized && self.error.is_none()
    }
}

/// Balances of one account pair at one point in the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Free balance on the native ledger
    pub native_free: U256,
    /// `eth_getBalance` of the execution address
    pub execution_raw_balance: U256,
    /// Token-view `balanceOf` of the execution address, when available
    pub execution_token_balance: Option<U256>,
    /// Logical timestamp
    pub taken_at: LogicalTime,
}

/// Diagnostic raised by reconciliation or mapping audits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anomaly {
    /// The transfer finalized successfully but the execution balance did not move.
    NoOpTransfer,
    /// No execution address (or reverse mapping) exists for the account.
    MappingMissing,
    /// The call shape was not recognised; the outcome rests on a guessed shape.
    SignatureUnresolved,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::NoOpTransfer => write!(
                f,
                "transfer finalized but the execution balance is unchanged; this runtime may not move native value into the execution layer"
            ),
            Anomaly::MappingMissing => write!(f, "no mapping between native and execution accounts"),
            Anomaly::SignatureUnresolved => write!(f, "transfer call shape was not recognised"),
        }
    }
}

/// Before/after comparison for one transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub before: BalanceSnapshot,
    pub after: BalanceSnapshot,
    /// `after.native_free - before.native_free`
    #[serde(with = "dec_i256")]
    pub native_delta: I256,
    /// `after.execution_raw_balance - before.execution_raw_balance`
    #[serde(with = "dec_i256")]
    pub execution_delta: I256,
    pub anomaly: Option<Anomaly>,
}

mod hex_key {
    use super::PublicKey;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(key: &PublicKey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(key)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PublicKey, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(D::Error::custom)?;
        if bytes.len() != 32 {
            return Err(D::Error::custom(format!(
                "invalid public key length: {} (expected 32)",
                bytes.len()
            )));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(key)
    }
}

mod dec_i256 {
    use super::I256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &I256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<I256, D::Error> {
        let s = String::deserialize(deserializer)?;
        I256::from_dec_str(&s).map_err(D::Error::custom)
    }
}
