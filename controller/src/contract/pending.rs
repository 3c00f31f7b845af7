//! # Pending Transactions
//!
//! A broadcast transaction waiting to be mined. Finalization is observed by
//! polling `eth_getTransactionReceipt`; there is no local timeout, the wait
//! lasts as long as the network takes. A failed lookup is logged and
//! retried on the next poll; only a mined receipt ends the wait.

use alloy::primitives::B256;
use tracing::{debug, info, warn};

use super::{abi, ContractError};
use crate::provider::{Signer, TransactionReceipt, TransactionRequest};
use crate::utils::truncate_string;

/// A transaction that has been broadcast but not yet observed in a block.
pub struct PendingTransaction {
    hash: B256,
    request: TransactionRequest,
    signer: Signer,
}

impl PendingTransaction {
    pub(crate) fn new(hash: B256, request: TransactionRequest, signer: Signer) -> Self {
        Self {
            hash,
            request,
            signer,
        }
    }

    /// Transaction hash.
    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Wait until the transaction is mined.
    ///
    /// ## Returns
    ///
    /// * `Ok(receipt)` - Mined and executed successfully
    /// * `Err(ContractError::Reverted)` - Mined but reverted; the reason is
    ///   recovered by replaying the call against the state its block
    ///   started from
    pub async fn wait(self) -> Result<TransactionReceipt, ContractError> {
        let short_hash = truncate_string(&self.hash.to_string(), 16);
        debug!("Waiting for {} to be mined", short_hash);

        loop {
            match self.signer.transaction_receipt(self.hash).await {
                Ok(Some(receipt)) => {
                    let block_number = receipt.block_number.unwrap_or_default();

                    if receipt.status() {
                        info!("✅ {} mined in block {}", short_hash, block_number);
                        return Ok(receipt);
                    }

                    let reason = self.replay_for_reason(block_number).await;
                    warn!(
                        "{} reverted in block {} ({})",
                        short_hash,
                        block_number,
                        reason.as_deref().unwrap_or("no reason")
                    );
                    return Err(ContractError::Reverted {
                        hash: self.hash,
                        reason,
                    });
                }
                Ok(None) => {}
                Err(e) => warn!("Receipt lookup for {} failed, retrying: {}", short_hash, e),
            }

            tokio::time::sleep(self.signer.poll_interval()).await;
        }
    }

    /// Re-run the transaction as a call on the parent of its block.
    async fn replay_for_reason(&self, block_number: u64) -> Option<String> {
        let parent = block_number.saturating_sub(1);
        match self.signer.call(&self.request, Some(parent)).await {
            Ok(_) => None,
            Err(e) => abi::revert_reason(&e),
        }
    }
}
