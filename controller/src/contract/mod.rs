//! # Contract Binding Module
//!
//! Binds a fixed contract address to a signer, producing a
//! [`ContractHandle`] with two capabilities. The interface is the typed
//! [`ILedger`] binding, so every call is one of its generated call structs.
//!
//! | Capability | RPC | Effect |
//! |------------|-----|--------|
//! | `read(call)` | `eth_call` | none, returns the decoded value |
//! | `write(call, value)` | `eth_sendTransaction` | returns a [`PendingTransaction`] |
//!
//! ## Write Flow
//!
//! ```text
//! 1. Check the call's mutability and payability
//!              ↓
//! 2. Encode calldata
//!              ↓
//! 3. Wallet signs + broadcasts → tx hash
//!              ↓
//! 4. PendingTransaction::wait() polls for the receipt
//!              ↓
//! 5. status 1 → Ok(receipt) / status 0 → replay call for revert reason
//! ```

pub mod abi;
pub mod pending;

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::rpc::types::TransactionInput;
use thiserror::Error;
use tracing::{debug, info};

use crate::provider::{Signer, TransactionRequest};

pub use abi::{ContractCall, ILedger, StateMutability};
pub use pending::PendingTransaction;

/// Errors raised by contract calls.
#[derive(Debug, Clone, Error)]
pub enum ContractError {
    /// A view function was used as a transaction.
    #[error("{0} is read-only")]
    NotWritable(String),

    /// Native currency attached to a non-payable function.
    #[error("{0} does not accept value")]
    NotPayable(String),

    /// A non-state-changing call failed.
    #[error("Read call failed: {0}")]
    Read(String),

    /// The call returned data that could not be decoded.
    #[error("Could not decode {method} result: {message}")]
    Decode { method: String, message: String },

    /// The wallet or node refused the transaction before broadcasting.
    #[error("Transaction rejected: {message}")]
    Rejected {
        reason: Option<String>,
        message: String,
    },

    /// The transaction was mined but execution reverted.
    #[error("Transaction {hash} reverted")]
    Reverted { hash: B256, reason: Option<String> },
}

impl ContractError {
    /// The chain-supplied revert reason, if one was recovered.
    pub fn reason(&self) -> Option<&str> {
        match self {
            ContractError::Rejected { reason, .. } | ContractError::Reverted { reason, .. } => {
                reason.as_deref()
            }
            _ => None,
        }
    }
}

struct Binding {
    address: Address,
    signer: Signer,
}

/// A contract bound to an address and a signer.
///
/// Cheap to clone. The binding never changes; reconnecting produces a new
/// handle.
#[derive(Clone)]
pub struct ContractHandle {
    inner: Arc<Binding>,
}

impl ContractHandle {
    /// Bind a contract. Makes no network calls.
    pub fn bind(address: Address, signer: Signer) -> Self {
        Self {
            inner: Arc::new(Binding { address, signer }),
        }
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.inner.address
    }

    /// The account transactions are sent from.
    pub fn account(&self) -> Address {
        self.inner.signer.address()
    }

    fn request(&self, data: Vec<u8>, value: Option<U256>) -> TransactionRequest {
        let data = Bytes::from(data);
        TransactionRequest {
            from: Some(self.account()),
            to: Some(TxKind::Call(self.address())),
            value,
            input: TransactionInput {
                input: Some(data.clone()),
                data: Some(data),
            },
            ..Default::default()
        }
    }

    /// Call a function without sending a transaction.
    pub async fn read<C: ContractCall>(&self, call: C) -> Result<C::Return, ContractError> {
        debug!("Reading {} on {}", C::SIGNATURE, self.address());

        let output = self
            .inner
            .signer
            .call(&self.request(call.abi_encode(), None), None)
            .await
            .map_err(|e| ContractError::Read(e.to_string()))?;

        C::abi_decode_returns(&output).map_err(|e| ContractError::Decode {
            method: C::SIGNATURE.to_string(),
            message: e.to_string(),
        })
    }

    /// Send a state-changing transaction.
    ///
    /// Returns as soon as the wallet has broadcast the transaction; use
    /// [`PendingTransaction::wait`] to wait for it to be mined.
    pub async fn write<C: ContractCall>(
        &self,
        call: C,
        value: Option<U256>,
    ) -> Result<PendingTransaction, ContractError> {
        if !C::MUTABILITY.is_write() {
            return Err(ContractError::NotWritable(C::SIGNATURE.to_string()));
        }

        let attaches_value = value.is_some_and(|v| v > U256::ZERO);
        if attaches_value && C::MUTABILITY != StateMutability::Payable {
            return Err(ContractError::NotPayable(C::SIGNATURE.to_string()));
        }

        let request = self.request(call.abi_encode(), value);

        let hash = self
            .inner
            .signer
            .send_transaction(&request)
            .await
            .map_err(|e| {
                let reason = if e.is_user_rejection() {
                    None
                } else {
                    abi::revert_reason(&e)
                };
                ContractError::Rejected {
                    reason,
                    message: e.to_string(),
                }
            })?;

        info!("Submitted {} as {}", C::SIGNATURE, hash);

        Ok(PendingTransaction::new(hash, request, self.inner.signer.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{connected_handle, FakeWallet, TEST_ACCOUNT, TEST_CONTRACT};
    use crate::utils::parse_ether;

    fn deposit(amount: U256) -> ILedger::depositCall {
        ILedger::depositCall { amount }
    }

    fn withdraw(amount: U256) -> ILedger::withdrawCall {
        ILedger::withdrawCall { amount }
    }

    #[tokio::test]
    async fn test_bind_makes_no_calls() {
        let wallet = FakeWallet::new();
        let handle = connected_handle(&wallet).await;

        assert_eq!(wallet.count("eth_call"), 0);
        assert_eq!(wallet.count("eth_sendTransaction"), 0);
        assert_eq!(handle.address(), TEST_CONTRACT);
        assert_eq!(handle.account(), TEST_ACCOUNT);
    }

    #[tokio::test]
    async fn test_read_balance() {
        let wallet = FakeWallet::new();
        wallet.set_balance(U256::from(7u64));
        let handle = connected_handle(&wallet).await;

        assert_eq!(
            handle.read(ILedger::getBalanceCall {}).await.unwrap(),
            U256::from(7u64)
        );
        assert_eq!(wallet.count("eth_sendTransaction"), 0);
    }

    #[tokio::test]
    async fn test_read_failure() {
        let wallet = FakeWallet::new();
        wallet.set_fail_reads(true);
        let handle = connected_handle(&wallet).await;

        assert!(matches!(
            handle.read(ILedger::getBalanceCall {}).await,
            Err(ContractError::Read(_))
        ));
    }

    #[tokio::test]
    async fn test_write_validation_happens_before_network() {
        let wallet = FakeWallet::new();
        let handle = connected_handle(&wallet).await;

        assert!(matches!(
            handle.write(ILedger::getBalanceCall {}, None).await,
            Err(ContractError::NotWritable(_))
        ));
        assert!(matches!(
            handle
                .write(withdraw(U256::from(1u64)), Some(U256::from(1u64)))
                .await,
            Err(ContractError::NotPayable(_))
        ));
        assert_eq!(wallet.count("eth_sendTransaction"), 0);
    }

    #[tokio::test]
    async fn test_write_and_wait() {
        let wallet = FakeWallet::new();
        let handle = connected_handle(&wallet).await;
        let amount = parse_ether("2").unwrap();

        let pending = handle.write(deposit(amount), Some(amount)).await.unwrap();
        let receipt = pending.wait().await.unwrap();

        assert!(receipt.status());
        assert_eq!(wallet.balance(), amount);
        assert_eq!(wallet.last_sender(), Some(TEST_ACCOUNT));
    }

    #[tokio::test]
    async fn test_write_rejected_with_reason() {
        let wallet = FakeWallet::new();
        let handle = connected_handle(&wallet).await;

        let err = handle
            .write(withdraw(parse_ether("1000").unwrap()), None)
            .await
            .err()
            .unwrap();

        assert!(matches!(err, ContractError::Rejected { .. }));
        assert_eq!(err.reason(), Some("insufficient funds"));
    }

    #[tokio::test]
    async fn test_user_rejected_signature_has_no_reason() {
        let wallet = FakeWallet::new();
        wallet.set_reject_transactions(true);
        let handle = connected_handle(&wallet).await;
        let amount = parse_ether("1").unwrap();

        let err = handle.write(deposit(amount), Some(amount)).await.err().unwrap();

        assert!(matches!(err, ContractError::Rejected { reason: None, .. }));
    }
}
