//! # Signer
//!
//! A signing handle bound to one authorized account. The wallet does the
//! actual signing; the signer fills in `from` and talks to the wallet on
//! that account's behalf.

use std::sync::Arc;
use std::time::Duration;

use alloy::hex;
use alloy::primitives::{Address, B256};
use alloy::rpc::types::BlockNumberOrTag;
use serde_json::{json, Value};

pub use alloy::rpc::types::{TransactionReceipt, TransactionRequest};

use super::{RpcError, WalletProvider};

fn to_param(request: &TransactionRequest) -> Result<Value, RpcError> {
    serde_json::to_value(request).map_err(|e| RpcError::Malformed(format!("Invalid request: {}", e)))
}

/// Signing handle for one account.
#[derive(Clone)]
pub struct Signer {
    /// The wallet that holds the account's key.
    provider: Arc<dyn WalletProvider>,

    /// The authorized account.
    account: Address,

    /// Receipt polling cadence.
    poll_interval: Duration,
}

impl Signer {
    /// Create a signer for an already authorized account.
    pub fn new(provider: Arc<dyn WalletProvider>, account: Address, poll_interval: Duration) -> Self {
        Self {
            provider,
            account,
            poll_interval,
        }
    }

    /// The account this signer acts for.
    pub fn address(&self) -> Address {
        self.account
    }

    /// How often to poll for receipts.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Execute a call without creating a transaction.
    ///
    /// `block` pins the call to a past block; `None` means latest.
    pub async fn call(
        &self,
        request: &TransactionRequest,
        block: Option<u64>,
    ) -> Result<Vec<u8>, RpcError> {
        let tag = block.map_or(BlockNumberOrTag::Latest, BlockNumberOrTag::Number);

        let result = self
            .provider
            .request("eth_call", json!([to_param(request)?, tag]))
            .await?;

        let data = result
            .as_str()
            .ok_or_else(|| RpcError::Malformed(format!("eth_call returned {}", result)))?;

        hex::decode(data).map_err(|e| RpcError::Malformed(format!("Invalid call data: {}", e)))
    }

    /// Ask the wallet to sign and broadcast a transaction.
    ///
    /// Returns the transaction hash as soon as the wallet accepts it.
    pub async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, RpcError> {
        let result = self
            .provider
            .request("eth_sendTransaction", json!([to_param(request)?]))
            .await?;

        serde_json::from_value(result).map_err(|e| RpcError::Malformed(format!("Invalid tx hash: {}", e)))
    }

    /// Look up the receipt of a transaction.
    ///
    /// Returns `Ok(None)` while the transaction is pending, including
    /// receipts that do not name a block yet.
    pub async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>, RpcError> {
        let result = self
            .provider
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;

        let receipt: Option<TransactionReceipt> = serde_json::from_value(result)
            .map_err(|e| RpcError::Malformed(format!("Invalid receipt: {}", e)))?;

        Ok(receipt.filter(|receipt| receipt.block_number.is_some()))
    }
}
