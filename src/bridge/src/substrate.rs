//! Native ledger adapter over a Substrate node.

use crate::errors::BridgeError;
use crate::ledger::{
    ArgMetadata, CallMetadata, NativeAccountInfo, NativeCall, NativeLedger, StatusNotice,
    StatusSubscription,
};
use async_trait::async_trait;
use primitives::{Account, ChainEvent, TransferCall, H160, H256, U256};
use std::str::FromStr;
use subxt::{
    backend::{legacy::LegacyRpcMethods, rpc::RpcClient},
    dynamic::{self, Value},
    ext::scale_value::{At, Primitive, Value as DecodedValue, ValueDef},
    tx::{TxInBlock, TxStatus},
    utils::AccountId32,
    OnlineClient, PolkadotConfig,
};
use subxt_signer::{sr25519::Keypair, SecretUri};
use tracing::{debug, info};

/// Pallet holding the claim-style mapping.
const CLAIM_PALLET: &str = "EvmAccounts";
/// Pallet holding the derived-address registration and its reverse index.
const MAP_PALLET: &str = "Revive";

type Client = OnlineClient<PolkadotConfig>;

/// Connection to the native ledger with the session signer.
pub struct SubstrateLedger {
    api: Client,
    rpc: LegacyRpcMethods<PolkadotConfig>,
    signer: Keypair,
    transfer_pallet: String,
    transfer_call: String,
}

impl SubstrateLedger {
    /// Connects to `url` and resolves the signer from a secret URI such as `//Alice`.
    pub async fn connect(
        url: &str,
        signer_uri: &str,
        transfer_pallet: &str,
        transfer_call: &str,
    ) -> Result<Self, BridgeError> {
        let stage = format!("connecting to {}", url);
        let rpc_client = RpcClient::from_url(url)
            .await
            .map_err(|e| BridgeError::network(&stage, e))?;
        let api = Client::from_rpc_client(rpc_client.clone())
            .await
            .map_err(|e| BridgeError::network(&stage, e))?;

        let uri = SecretUri::from_str(signer_uri)
            .map_err(|e| BridgeError::InvalidAddress(format!("Invalid signer URI: {}", e)))?;
        let signer = Keypair::from_uri(&uri)
            .map_err(|e| BridgeError::InvalidAddress(format!("Invalid signer URI: {}", e)))?;

        info!("Connected to {}", url);
        Ok(Self {
            api,
            rpc: LegacyRpcMethods::new(rpc_client),
            signer,
            transfer_pallet: transfer_pallet.to_string(),
            transfer_call: transfer_call.to_string(),
        })
    }

    /// The signing account, unmapped.
    pub fn signer_account(&self) -> Account {
        let public_key = self.signer.public_key();
        let raw = public_key.0;
        Account::new(public_key.to_account_id().to_string(), raw)
    }

    async fn fetch_value(
        &self,
        pallet: &str,
        entry: &str,
        key: Vec<Value>,
    ) -> Result<Option<DecodedValue<u32>>, BridgeError> {
        let stage = format!("{}.{}", pallet, entry);
        let address = dynamic::storage(pallet, entry, key);
        let thunk = self
            .api
            .storage()
            .at_latest()
            .await
            .map_err(|e| BridgeError::network(&stage, e))?
            .fetch(&address)
            .await
            .map_err(|e| BridgeError::network(&stage, e))?;
        match thunk {
            Some(thunk) => Ok(Some(thunk.to_value().map_err(|e| BridgeError::network(&stage, e))?)),
            None => Ok(None),
        }
    }
}

fn parse_account(native_address: &str) -> Result<AccountId32, BridgeError> {
    AccountId32::from_str(native_address)
        .map_err(|e| BridgeError::InvalidAddress(format!("{}: {:?}", native_address, e)))
}

fn undecodable(stage: &str, detail: impl std::fmt::Display) -> BridgeError {
    BridgeError::Metadata(format!("{} undecodable: {}", stage, detail))
}

/// Flattens a decoded byte array (possibly wrapped in newtypes) into bytes.
fn collect_bytes<T>(value: &DecodedValue<T>, stage: &str, out: &mut Vec<u8>) -> Result<(), BridgeError> {
    match &value.value {
        ValueDef::Composite(composite) => composite
            .values()
            .try_for_each(|inner| collect_bytes(inner, stage, out)),
        ValueDef::Primitive(Primitive::U128(byte)) => {
            let byte = u8::try_from(*byte).map_err(|_| undecodable(stage, format!("{} is not a byte", byte)))?;
            out.push(byte);
            Ok(())
        }
        _ => Err(undecodable(stage, "expected a byte array")),
    }
}

fn decode_fixed<T, const N: usize>(value: &DecodedValue<T>, stage: &str) -> Result<[u8; N], BridgeError> {
    let mut bytes = Vec::with_capacity(N);
    collect_bytes(value, stage, &mut bytes)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| undecodable(stage, format!("expected {} bytes, got {}", N, len)))
}

fn decode_h160<T>(value: &DecodedValue<T>) -> Result<H160, BridgeError> {
    decode_fixed::<T, 20>(value, &format!("{}.EvmAddresses", CLAIM_PALLET)).map(H160::from)
}

fn decode_account<T>(value: &DecodedValue<T>) -> Result<String, BridgeError> {
    decode_fixed::<T, 32>(value, &format!("{}.OriginalAccount", MAP_PALLET))
        .map(|raw| AccountId32(raw).to_string())
}

fn decode_account_info<T>(value: &DecodedValue<T>) -> Result<NativeAccountInfo, BridgeError> {
    const STAGE: &str = "System.Account";
    let balance = |field: &str| {
        value
            .at("data")
            .at(field)
            .and_then(|v| v.as_u128())
            .map(U256::from)
            .ok_or_else(|| undecodable(STAGE, format!("data.{} is not a balance", field)))
    };
    let nonce = value
        .at("nonce")
        .and_then(|v| v.as_u128())
        .and_then(|nonce| u64::try_from(nonce).ok())
        .ok_or_else(|| undecodable(STAGE, "nonce is not an index"))?;
    Ok(NativeAccountInfo {
        free: balance("free")?,
        reserved: balance("reserved")?,
        nonce,
    })
}

fn dispatch_failed(events: &[ChainEvent]) -> bool {
    events
        .iter()
        .any(|event| event.pallet == "System" && event.variant == "ExtrinsicFailed")
}

async fn block_notice(
    tx: TxInBlock<PolkadotConfig, Client>,
) -> Result<(H256, Vec<ChainEvent>, Option<String>), BridgeError> {
    let block = H256::from_slice(tx.block_hash().as_ref());
    let events = tx
        .fetch_events()
        .await
        .map_err(|e| BridgeError::network("fetching extrinsic events", e))?;

    let mut emitted = Vec::new();
    for event in events.iter() {
        let event = event.map_err(|e| BridgeError::network("decoding extrinsic events", e))?;
        emitted.push(ChainEvent::new(event.pallet_name(), event.variant_name()));
    }

    let dispatch_error = if dispatch_failed(&emitted) {
        Some(match tx.wait_for_success().await {
            Err(e) => e.to_string(),
            Ok(_) => "System.ExtrinsicFailed".to_string(),
        })
    } else {
        None
    };
    Ok((block, emitted, dispatch_error))
}

async fn to_notice(status: TxStatus<PolkadotConfig, Client>) -> Result<StatusNotice, BridgeError> {
    Ok(match status {
        TxStatus::Validated | TxStatus::Broadcasted { .. } => StatusNotice::Pending,
        TxStatus::NoLongerInBestBlock => StatusNotice::Retracted,
        TxStatus::InBestBlock(tx) => {
            let (block, events, dispatch_error) = block_notice(tx).await?;
            StatusNotice::InBlock {
                block,
                events,
                dispatch_error,
            }
        }
        TxStatus::InFinalizedBlock(tx) => {
            let (block, events, dispatch_error) = block_notice(tx).await?;
            StatusNotice::Finalized {
                block,
                events,
                dispatch_error,
            }
        }
        TxStatus::Error { message } => {
            return Err(BridgeError::network("watching submission", message))
        }
        TxStatus::Invalid { message } => StatusNotice::Invalid(message),
        TxStatus::Dropped { message } => StatusNotice::Dropped(message),
    })
}

#[async_trait]
impl NativeLedger for SubstrateLedger {
    async fn chain_name(&self) -> Result<String, BridgeError> {
        self.rpc
            .system_chain()
            .await
            .map_err(|e| BridgeError::network("system_chain", e))
    }

    async fn call_metadata(&self, pallet: &str, call: &str) -> Result<Option<CallMetadata>, BridgeError> {
        let metadata = self.api.metadata();
        let variant = match metadata
            .pallet_by_name(pallet)
            .and_then(|p| p.call_variant_by_name(call))
        {
            Some(variant) => variant,
            None => return Ok(None),
        };

        let args = variant
            .fields
            .iter()
            .map(|field| {
                let path = metadata
                    .types()
                    .resolve(field.ty.id)
                    .map(|ty| ty.path.segments.join("::"))
                    .unwrap_or_default();
                let type_name = match (&field.type_name, path.is_empty()) {
                    (Some(name), true) => name.clone(),
                    (Some(name), false) if *name != path => format!("{} ({})", name, path),
                    (Some(name), false) => name.clone(),
                    (None, _) => path,
                };
                ArgMetadata::new(field.name.clone().unwrap_or_default(), type_name)
            })
            .collect();
        Ok(Some(CallMetadata { args }))
    }

    async fn account_info(&self, native_address: &str) -> Result<NativeAccountInfo, BridgeError> {
        let account = parse_account(native_address)?;
        let value = self
            .fetch_value("System", "Account", vec![Value::from_bytes(account.0)])
            .await?;
        match value {
            Some(value) => decode_account_info(&value),
            None => Ok(NativeAccountInfo::default()),
        }
    }

    async fn evm_address_of(&self, native_address: &str) -> Result<Option<H160>, BridgeError> {
        let account = parse_account(native_address)?;
        let value = self
            .fetch_value(CLAIM_PALLET, "EvmAddresses", vec![Value::from_bytes(account.0)])
            .await?;
        value.as_ref().map(decode_h160).transpose()
    }

    async fn original_account(&self, address: H160) -> Result<Option<String>, BridgeError> {
        let value = self
            .fetch_value(MAP_PALLET, "OriginalAccount", vec![Value::from_bytes(address.as_bytes())])
            .await?;
        value.as_ref().map(decode_account).transpose()
    }

    async fn submit(&self, call: NativeCall) -> Result<StatusSubscription, BridgeError> {
        let stage = format!("submitting {}", call);
        let payload = match &call {
            NativeCall::ClaimDefaultAccount => {
                dynamic::tx(CLAIM_PALLET, "claim_default_account", Vec::<Value>::new())
            }
            NativeCall::MapAccount => dynamic::tx(MAP_PALLET, "map_account", Vec::<Value>::new()),
            NativeCall::Transfer(TransferCall::TargetAmount { target, amount }) => dynamic::tx(
                self.transfer_pallet.as_str(),
                self.transfer_call.as_str(),
                vec![Value::from_bytes(target.as_bytes()), Value::u128(*amount)],
            ),
            NativeCall::Transfer(TransferCall::SourceTargetAmount { source, target, amount }) => {
                let source = parse_account(source)?;
                dynamic::tx(
                    self.transfer_pallet.as_str(),
                    self.transfer_call.as_str(),
                    vec![
                        Value::from_bytes(source.0),
                        Value::from_bytes(target.as_bytes()),
                        Value::u128(*amount),
                    ],
                )
            }
        };

        let progress = self
            .api
            .tx()
            .sign_and_submit_then_watch_default(&payload, &self.signer)
            .await
            .map_err(|e| BridgeError::network(&stage, e))?;
        debug!("{}: watching status", stage);

        let notices = futures::stream::unfold(progress, |mut progress| async move {
            let status = progress.next().await?;
            let notice = match status {
                Ok(status) => to_notice(status).await,
                Err(e) => Err(BridgeError::network("watching submission", e)),
            };
            Some((notice, progress))
        });

        Ok(StatusSubscription::new(Box::pin(notices))
            .with_unsubscribe(move || debug!("{}: status subscription released", stage)))
    }
}
