//! # Wallet Provider Module
//!
//! This module wraps the user's wallet: the component that holds keys and
//! signs transactions on request. The controller never holds keys itself.
//!
//! ## Layers
//!
//! ```text
//! ProviderAdapter            connect() → Signer
//!       │
//!       ▼
//! dyn WalletProvider         request(method, params) (EIP-1193 style)
//!       │
//!       ├── HttpProvider     JSON-RPC over HTTP
//!       └── (tests)          in-memory fake wallet
//! ```
//!
//! The provider is passed in as a capability rather than discovered from
//! ambient state, so the absence of a wallet is just `None`.

pub mod http;
pub mod signer;

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

pub use http::HttpProvider;
pub use signer::{Signer, TransactionReceipt, TransactionRequest};

/// EIP-1193 error code for "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// Errors returned by a single provider request.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// The provider answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    /// The request never produced a JSON-RPC answer.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The answer did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl RpcError {
    /// Whether the user declined the prompt behind this request.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, RpcError::Rpc { code, .. } if *code == USER_REJECTED_CODE)
    }
}

/// Errors that can occur while establishing a wallet session.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// No wallet is present in the environment.
    #[error("No wallet provider available")]
    NoProvider,

    /// The user declined the account access prompt.
    #[error("User rejected the account access request")]
    UserRejected,

    /// Any other provider failure.
    #[error("Wallet connection failed: {0}")]
    Connection(String),
}

/// The request surface of a wallet.
///
/// Mirrors the EIP-1193 `request({ method, params })` call that browser
/// wallets expose.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Send one request to the wallet.
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// Wraps an optional wallet and turns it into a signing handle.
#[derive(Clone)]
pub struct ProviderAdapter {
    /// The wallet, if one is present.
    provider: Option<Arc<dyn WalletProvider>>,

    /// Receipt polling cadence handed to every signer.
    poll_interval: Duration,
}

impl ProviderAdapter {
    /// Create an adapter around an (optional) wallet.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, poll_interval: Duration) -> Self {
        Self {
            provider,
            poll_interval,
        }
    }

    /// Build the adapter described by the configuration.
    ///
    /// Without `WALLET_PROVIDER_URL` the adapter has no wallet and every
    /// `connect()` fails with [`ProviderError::NoProvider`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let provider: Option<Arc<dyn WalletProvider>> = match &config.wallet_provider_url {
            Some(url) => {
                info!("Wallet provider: {}", url);
                let http: Arc<dyn WalletProvider> = Arc::new(HttpProvider::new(url)?);
                Some(http)
            }
            None => {
                warn!("No wallet provider configured");
                None
            }
        };

        Ok(Self::new(provider, config.receipt_poll_interval()))
    }

    /// Whether a wallet is present.
    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Ask the wallet which chain it is on.
    pub async fn chain_id(&self) -> Result<u64, ProviderError> {
        let provider = self.provider.as_ref().ok_or(ProviderError::NoProvider)?;

        let value = provider
            .request("eth_chainId", json!([]))
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let hex = value
            .as_str()
            .ok_or_else(|| ProviderError::Connection(format!("Unexpected chain id: {}", value)))?;

        u64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| ProviderError::Connection(format!("Invalid chain id {}: {}", hex, e)))
    }

    /// Request account access and return a signer for the first account.
    ///
    /// Issues exactly one `eth_requestAccounts` per call. Nothing is sent
    /// when no wallet is present.
    pub async fn connect(&self) -> Result<Signer, ProviderError> {
        let provider = self.provider.as_ref().ok_or(ProviderError::NoProvider)?;

        debug!("Requesting account access");

        let accounts = provider
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(|e| {
                if e.is_user_rejection() {
                    ProviderError::UserRejected
                } else {
                    ProviderError::Connection(e.to_string())
                }
            })?;

        let account = accounts
            .as_array()
            .and_then(|list| list.first())
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Connection("Wallet returned no accounts".to_string()))?;

        let account = account
            .parse::<Address>()
            .map_err(|e| ProviderError::Connection(format!("Invalid account {}: {}", account, e)))?;

        info!("Wallet authorized account {}", account);

        Ok(Signer::new(provider.clone(), account, self.poll_interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeWallet, TEST_ACCOUNT};

    #[tokio::test]
    async fn test_connect_without_provider() {
        let adapter = ProviderAdapter::new(None, Duration::from_millis(1));

        assert!(!adapter.is_available());
        assert!(matches!(adapter.connect().await, Err(ProviderError::NoProvider)));
    }

    #[tokio::test]
    async fn test_connect_returns_signer_for_first_account() {
        let wallet = FakeWallet::new();
        let adapter = ProviderAdapter::new(wallet.provider(), Duration::from_millis(1));

        let signer = adapter.connect().await.unwrap();

        assert_eq!(signer.address(), TEST_ACCOUNT);
        assert_eq!(wallet.count("eth_requestAccounts"), 1);
    }

    #[tokio::test]
    async fn test_connect_user_rejection() {
        let wallet = FakeWallet::new();
        wallet.set_reject_accounts(true);
        let adapter = ProviderAdapter::new(wallet.provider(), Duration::from_millis(1));

        assert!(matches!(adapter.connect().await, Err(ProviderError::UserRejected)));
        assert_eq!(wallet.count("eth_requestAccounts"), 1);
    }

    #[tokio::test]
    async fn test_connect_empty_account_list() {
        let wallet = FakeWallet::new();
        wallet.set_no_accounts(true);
        let adapter = ProviderAdapter::new(wallet.provider(), Duration::from_millis(1));

        assert!(matches!(adapter.connect().await, Err(ProviderError::Connection(_))));
    }

    #[tokio::test]
    async fn test_chain_id() {
        let adapter = ProviderAdapter::new(FakeWallet::new().provider(), Duration::from_millis(1));
        assert_eq!(adapter.chain_id().await.unwrap(), 31337);
    }

    #[test]
    fn test_user_rejection_code() {
        let rejected = RpcError::Rpc {
            code: USER_REJECTED_CODE,
            message: "User rejected the request.".to_string(),
            data: None,
        };
        assert!(rejected.is_user_rejection());
        assert!(!RpcError::Transport("connection refused".to_string()).is_user_rejection());
    }
}
