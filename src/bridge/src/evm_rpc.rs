//! JSON-RPC client for the execution layer.

use crate::bindings::NativeTokenView;
use crate::errors::BridgeError;
use crate::ledger::ExecutionLedger;
use async_trait::async_trait;
use ethers::providers::{Http, Provider};
use primitives::{format_execution_address, H160, U256};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Client for `eth_getBalance` and token-view reads.
pub struct EthRpcClient {
    url: String,
    http: reqwest::Client,
    provider: Arc<Provider<Http>>,
    next_id: AtomicU64,
}

impl EthRpcClient {
    /// Creates a client for the endpoint at `url`.
    pub fn new(url: &str) -> Result<Self, BridgeError> {
        let provider = Provider::<Http>::try_from(url)
            .map_err(|e| BridgeError::network(format!("connecting to {}", url), e))?;
        Ok(Self {
            url: url.to_string(),
            http: reqwest::Client::new(),
            provider: Arc::new(provider),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends one JSON-RPC request and returns its `result`.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, BridgeError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BridgeError::network(method, e))?;

        let response_text = response
            .text()
            .await
            .map_err(|e| BridgeError::network(method, format!("Failed to get response text: {}", e)))?;
        debug!("{} response: {}", method, response_text);

        decode_envelope(method, &response_text)
    }
}

/// Extracts `result` from a JSON-RPC response body.
pub fn decode_envelope(method: &str, body: &str) -> Result<Value, BridgeError> {
    if body.is_empty() {
        return Err(BridgeError::network(method, "Empty response from node"));
    }

    let response: Value = serde_json::from_str(body)
        .map_err(|e| BridgeError::network(method, format!("Failed to parse response: {}", e)))?;

    if let Some(error) = response.get("error") {
        if !error.is_null() {
            return Err(BridgeError::RpcError {
                method: method.to_string(),
                error: error.to_string(),
            });
        }
    }

    response
        .get("result")
        .cloned()
        .ok_or_else(|| BridgeError::network(method, format!("No result in response: {}", body)))
}

/// Parses a hex quantity such as `"0x8ac7230489e80000"`.
pub fn parse_quantity(method: &str, value: &Value) -> Result<U256, BridgeError> {
    let text = value
        .as_str()
        .ok_or_else(|| BridgeError::network(method, format!("Invalid quantity: {}", value)))?;
    let digits = text
        .strip_prefix("0x")
        .filter(|d| !d.is_empty())
        .ok_or_else(|| BridgeError::network(method, format!("Invalid quantity: {}", text)))?;
    U256::from_str_radix(digits, 16)
        .map_err(|e| BridgeError::network(method, format!("Invalid quantity {}: {:?}", text, e)))
}

#[async_trait]
impl ExecutionLedger for EthRpcClient {
    async fn balance(&self, address: H160) -> Result<U256, BridgeError> {
        let result = self
            .request(
                "eth_getBalance",
                serde_json::json!([format_execution_address(&address), "latest"]),
            )
            .await?;
        parse_quantity("eth_getBalance", &result)
    }

    async fn token_balance(&self, contract: H160, holder: H160) -> Result<U256, BridgeError> {
        let view = NativeTokenView::new(contract, self.provider.clone())?;
        view.balance_of(holder)?.call().await.map_err(|e| {
            BridgeError::network(
                format!("balanceOf({}) on {}", format_execution_address(&holder), format_execution_address(&contract)),
                e,
            )
        })
    }
}
