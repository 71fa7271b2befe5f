//! JSON-RPC session with the target network.
//!
//! Every pipeline stage talks to the chain through [`ChainRpc`]. [`HttpRpc`] is the
//! production implementation backed by `reqwest`; tests substitute an in-memory chain.

use std::{future::Future, time::Duration};

use alloy_core::primitives::{Address, B256, Bytes, U64, U256};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure of a single JSON-RPC round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// The endpoint could not be reached or did not answer with JSON-RPC.
    #[error("transport error: {0}")]
    Transport(String),
    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Response { code: i64, message: String },
    /// The node answered, but the result had an unexpected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

/// Payload for `eth_estimateGas`. `to` is absent for contract creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    pub data: Bytes,
}

/// The subset of an `eth_getTransactionReceipt` result used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// `1` on success, `0` on revert. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<U64>,
    pub gas_used: U64,
}

impl TransactionReceipt {
    /// Whether execution succeeded.
    pub fn succeeded(&self) -> bool {
        self.status != Some(U64::ZERO)
    }
}

/// Network operations the deployment pipeline depends on.
pub trait ChainRpc: Send + Sync {
    /// `eth_chainId`
    fn chain_id(&self) -> impl Future<Output = Result<u64, RpcError>> + Send;

    /// `eth_gasPrice`. `None` when the node returned `null`.
    fn gas_price(&self) -> impl Future<Output = Result<Option<U256>, RpcError>> + Send;

    /// `eth_estimateGas` against the latest block.
    fn estimate_gas(
        &self,
        request: &CallRequest,
    ) -> impl Future<Output = Result<u64, RpcError>> + Send;

    /// `eth_getTransactionCount` including pending transactions.
    fn transaction_count(
        &self,
        address: Address,
    ) -> impl Future<Output = Result<u64, RpcError>> + Send;

    /// `eth_sendRawTransaction`
    fn send_raw_transaction(
        &self,
        raw: &Bytes,
    ) -> impl Future<Output = Result<B256, RpcError>> + Send;

    /// `eth_getTransactionReceipt`. `None` while the transaction is pending.
    fn transaction_receipt(
        &self,
        hash: B256,
    ) -> impl Future<Output = Result<Option<TransactionReceipt>, RpcError>> + Send;

    /// `eth_blockNumber`
    fn block_number(&self) -> impl Future<Output = Result<u64, RpcError>> + Send;
}

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, RpcError> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .map_err(|e| RpcError::Transport(format!("Failed to create HTTP client: {e}")))
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, RpcError> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .map_err(|e| RpcError::Transport(format!("Failed to send {method} request: {e}")))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| RpcError::Transport(format!("Failed to read {method} response: {e}")))?;

    // Non-JSON bodies (gateway errors, HTML pages) mean the node itself never answered.
    let result: Value = serde_json::from_slice(&body).map_err(|_| {
        RpcError::Transport(format!("{method} returned HTTP {status} without a JSON-RPC body"))
    })?;

    parse_response(method, result)
}

/// Split a JSON-RPC response envelope into its result or error.
fn parse_response<T: DeserializeOwned>(method: &str, result: Value) -> Result<T, RpcError> {
    if let Some(error) = result.get("error") {
        return Err(RpcError::Response {
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
        });
    }

    let result_value = result
        .get("result")
        .cloned()
        .ok_or_else(|| RpcError::Decode(format!("No result in {method} response")))?;

    serde_json::from_value(result_value)
        .map_err(|e| RpcError::Decode(format!("Failed to deserialize {method} result: {e}")))
}

/// [`ChainRpc`] over HTTP JSON-RPC.
#[derive(Debug, Clone)]
pub struct HttpRpc {
    client: reqwest::Client,
    url: Url,
}

impl HttpRpc {
    /// Open a session against `url`.
    pub fn new(url: Url) -> Result<Self, RpcError> {
        Ok(Self {
            client: create_client()?,
            url,
        })
    }

    /// The endpoint this session talks to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T, RpcError> {
        json_rpc_call(&self.client, self.url.as_str(), method, params).await
    }
}

impl ChainRpc for HttpRpc {
    async fn chain_id(&self) -> Result<u64, RpcError> {
        let id: U64 = self.call("eth_chainId", vec![]).await?;
        Ok(id.to::<u64>())
    }

    async fn gas_price(&self) -> Result<Option<U256>, RpcError> {
        self.call("eth_gasPrice", vec![]).await
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, RpcError> {
        let request = serde_json::to_value(request)
            .map_err(|e| RpcError::Decode(format!("Failed to encode call request: {e}")))?;
        let gas: U64 = self.call("eth_estimateGas", vec![request]).await?;
        Ok(gas.to::<u64>())
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, RpcError> {
        let count: U64 = self
            .call(
                "eth_getTransactionCount",
                vec![serde_json::json!(address), serde_json::json!("pending")],
            )
            .await?;
        Ok(count.to::<u64>())
    }

    async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, RpcError> {
        self.call("eth_sendRawTransaction", vec![serde_json::json!(raw)])
            .await
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, RpcError> {
        self.call("eth_getTransactionReceipt", vec![serde_json::json!(hash)])
            .await
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        let number: U64 = self.call("eth_blockNumber", vec![]).await?;
        Ok(number.to::<u64>())
    }
}
