//! # HTTP Wallet Provider
//!
//! Speaks JSON-RPC 2.0 to a wallet endpoint over HTTP. Any endpoint that
//! manages the user's keys and answers `eth_requestAccounts` and
//! `eth_sendTransaction` works: a local development node with unlocked
//! accounts, or a wallet bridge that forwards to a browser extension.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{ProviderError, RpcError, WalletProvider};

/// A JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Wallet provider reached over HTTP.
pub struct HttpProvider {
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,

    /// JSON-RPC endpoint.
    url: String,

    /// Request id counter.
    next_id: AtomicU64,
}

impl HttpProvider {
    /// Create a provider for the given endpoint.
    ///
    /// No request is made until the first call.
    pub fn new(url: &str) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ProviderError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl WalletProvider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("→ [{}] {}", id, method);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status();
        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::Malformed(format!("HTTP {}: {}", status, e)))?;

        if let Some(error) = envelope.error {
            debug!("← [{}] {} failed: {} {}", id, method, error.code, error.message);
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        debug!("← [{}] {} ok", id, method);
        Ok(envelope.result.unwrap_or(Value::Null))
    }
}
