//! In-memory wallet and reporter used by unit tests.
//!
//! `FakeWallet` answers the handful of RPC methods the controller uses and
//! keeps a single ledger balance for [`TEST_ACCOUNT`], enough to exercise
//! deposits, withdrawals, reverts and receipt polling without a node.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::hex;
use alloy::primitives::{address, Address, B256, U256};
use alloy::sol_types::SolInterface;
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::contract::abi::{self, ILedger::ILedgerCalls};
use crate::contract::ContractHandle;
use crate::provider::{
    ProviderAdapter, RpcError, TransactionRequest, WalletProvider, USER_REJECTED_CODE,
};
use crate::services::{SessionController, TransactionOrchestrator};
use crate::status::{StateChange, StatusEvent, StatusReporter};

pub const TEST_ACCOUNT: Address = address!("0101010101010101010101010101010101010101");
pub const TEST_CONTRACT: Address = address!("94a39Ee9df7823312b869b8d81E152493B1df810");

const POLL_INTERVAL: Duration = Duration::from_millis(1);
const REVERT_REASON: &str = "insufficient funds";

struct PendingReceipt {
    polls_left: u32,
    block_number: u64,
    success: bool,
}

#[derive(Default)]
struct WalletState {
    account: Option<Address>,
    balance: U256,
    reject_accounts: bool,
    no_accounts: bool,
    reject_transactions: bool,
    fail_reads: bool,
    failing_receipts: u32,
    revert_on_chain: bool,
    pending_polls: u32,
    next_tx: u64,
    last_value: Option<U256>,
    last_sender: Option<Address>,
    call_senders: Vec<Address>,
    last_call_block: Option<Value>,
    receipts: HashMap<B256, PendingReceipt>,
    raw_receipts: HashMap<B256, Value>,
    calls: Vec<String>,
}

pub struct FakeWallet {
    state: Mutex<WalletState>,
}

impl FakeWallet {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(WalletState::default()),
        })
    }

    pub fn provider(self: &Arc<Self>) -> Option<Arc<dyn WalletProvider>> {
        let provider: Arc<dyn WalletProvider> = self.clone();
        Some(provider)
    }

    pub fn set_account(&self, account: Address) {
        self.state.lock().unwrap().account = Some(account);
    }

    pub fn set_balance(&self, balance: U256) {
        self.state.lock().unwrap().balance = balance;
    }

    pub fn balance(&self) -> U256 {
        self.state.lock().unwrap().balance
    }

    pub fn set_reject_accounts(&self, on: bool) {
        self.state.lock().unwrap().reject_accounts = on;
    }

    pub fn set_no_accounts(&self, on: bool) {
        self.state.lock().unwrap().no_accounts = on;
    }

    pub fn set_reject_transactions(&self, on: bool) {
        self.state.lock().unwrap().reject_transactions = on;
    }

    pub fn set_fail_reads(&self, on: bool) {
        self.state.lock().unwrap().fail_reads = on;
    }

    /// Fail the next `lookups` receipt requests with a transport error.
    pub fn set_failing_receipts(&self, lookups: u32) {
        self.state.lock().unwrap().failing_receipts = lookups;
    }

    /// Accept over-balance withdrawals and fail them in the receipt instead.
    pub fn set_revert_on_chain(&self, on: bool) {
        self.state.lock().unwrap().revert_on_chain = on;
    }

    /// Number of `null` receipt answers before each transaction is mined.
    pub fn set_pending_polls(&self, polls: u32) {
        self.state.lock().unwrap().pending_polls = polls;
    }

    /// Answer receipt lookups for `hash` with `receipt` verbatim.
    pub fn set_raw_receipt(&self, hash: B256, receipt: Value) {
        self.state.lock().unwrap().raw_receipts.insert(hash, receipt);
    }

    /// Value attached to the last transaction sent.
    pub fn last_value(&self) -> Option<U256> {
        self.state.lock().unwrap().last_value
    }

    /// `from` of the last transaction sent.
    pub fn last_sender(&self) -> Option<Address> {
        self.state.lock().unwrap().last_sender
    }

    /// `from` of every `eth_call`, in order.
    pub fn call_senders(&self) -> Vec<Address> {
        self.state.lock().unwrap().call_senders.clone()
    }

    /// Block tag of the last `eth_call`.
    pub fn last_call_block(&self) -> Option<Value> {
        self.state.lock().unwrap().last_call_block.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|m| *m == method).count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }
}

/// A mined receipt as a node returns it.
pub fn receipt_json(hash: B256, block_number: u64, success: bool) -> Value {
    json!({
        "type": "0x2",
        "status": if success { "0x1" } else { "0x0" },
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": format!("0x{}", "0".repeat(512)),
        "transactionHash": hash,
        "transactionIndex": "0x0",
        "blockHash": B256::repeat_byte(0xbb),
        "blockNumber": format!("{:#x}", block_number),
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x1",
        "from": TEST_ACCOUNT,
        "to": TEST_CONTRACT,
        "contractAddress": null,
    })
}

fn rpc_error(code: i64, message: &str) -> RpcError {
    RpcError::Rpc {
        code,
        message: message.to_string(),
        data: None,
    }
}

fn revert_error() -> RpcError {
    RpcError::Rpc {
        code: 3,
        message: format!("execution reverted: {}", REVERT_REASON),
        data: Some(json!(hex::encode_prefixed(abi::encode_revert_reason(REVERT_REASON)))),
    }
}

/// Parse a transaction object and decode its ledger call, if any.
fn decode_tx(params: &Value) -> Result<(TransactionRequest, Option<ILedgerCalls>), RpcError> {
    let tx: TransactionRequest = serde_json::from_value(params[0].clone())
        .map_err(|e| RpcError::Malformed(e.to_string()))?;
    let call = tx
        .input
        .input()
        .and_then(|data| ILedgerCalls::abi_decode(data).ok());

    Ok((tx, call))
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method.to_string());

        match method {
            "eth_chainId" => Ok(json!("0x7a69")),

            "eth_requestAccounts" => {
                if state.reject_accounts {
                    return Err(rpc_error(USER_REJECTED_CODE, "User rejected the request."));
                }
                if state.no_accounts {
                    return Ok(json!([]));
                }
                let account = state.account.unwrap_or(TEST_ACCOUNT);
                Ok(json!([account.to_string()]))
            }

            "eth_call" => {
                let (tx, call) = decode_tx(&params)?;
                if let Some(from) = tx.from {
                    state.call_senders.push(from);
                }
                state.last_call_block = params.get(1).cloned();

                match call {
                    Some(ILedgerCalls::getBalance(_)) => {
                        if state.fail_reads {
                            return Err(RpcError::Transport("node unavailable".to_string()));
                        }
                        Ok(json!(hex::encode_prefixed(state.balance.to_be_bytes::<32>())))
                    }
                    Some(ILedgerCalls::withdraw(call)) if call.amount > state.balance => {
                        Err(revert_error())
                    }
                    _ => Ok(json!("0x")),
                }
            }

            "eth_sendTransaction" => {
                if state.reject_transactions {
                    return Err(rpc_error(USER_REJECTED_CODE, "User denied transaction signature."));
                }

                let (tx, call) = decode_tx(&params)?;
                let mut success = true;

                match call {
                    Some(ILedgerCalls::deposit(_)) => {
                        state.balance += tx.value.unwrap_or(U256::ZERO);
                    }
                    Some(ILedgerCalls::withdraw(call)) => {
                        if call.amount > state.balance {
                            if !state.revert_on_chain {
                                return Err(revert_error());
                            }
                            success = false;
                        } else {
                            state.balance -= call.amount;
                        }
                    }
                    _ => {}
                }

                state.next_tx += 1;
                state.last_value = tx.value;
                state.last_sender = tx.from;
                let hash = B256::from(U256::from(state.next_tx).to_be_bytes::<32>());
                let receipt = PendingReceipt {
                    polls_left: state.pending_polls,
                    block_number: state.next_tx,
                    success,
                };
                state.receipts.insert(hash, receipt);

                Ok(json!(hash))
            }

            "eth_getTransactionReceipt" => {
                if state.failing_receipts > 0 {
                    state.failing_receipts -= 1;
                    return Err(RpcError::Transport("receipt lookup failed".to_string()));
                }

                let hash: B256 = serde_json::from_value(params[0].clone())
                    .map_err(|e| RpcError::Malformed(e.to_string()))?;
                if let Some(raw) = state.raw_receipts.get(&hash) {
                    return Ok(raw.clone());
                }
                let Some(receipt) = state.receipts.get_mut(&hash) else {
                    return Ok(Value::Null);
                };
                if receipt.polls_left > 0 {
                    receipt.polls_left -= 1;
                    return Ok(Value::Null);
                }

                Ok(receipt_json(hash, receipt.block_number, receipt.success))
            }

            other => Err(rpc_error(-32601, &format!("method {} not supported", other))),
        }
    }
}

/// Reporter that keeps everything it is told.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<StatusEvent>>,
    changes: Mutex<Vec<StateChange>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }

    pub fn changes(&self) -> Vec<StateChange> {
        self.changes.lock().unwrap().clone()
    }
}

impl StatusReporter for RecordingReporter {
    fn report(&self, event: &StatusEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn state_changed(&self, change: &StateChange) {
        self.changes.lock().unwrap().push(change.clone());
    }
}

/// A handle bound to [`TEST_CONTRACT`] through the fake wallet.
pub async fn connected_handle(wallet: &Arc<FakeWallet>) -> ContractHandle {
    let adapter = ProviderAdapter::new(wallet.provider(), POLL_INTERVAL);
    let signer = adapter.connect().await.unwrap();
    ContractHandle::bind(TEST_CONTRACT, signer)
}

pub fn session_with(
    provider: Option<Arc<dyn WalletProvider>>,
    reporter: Arc<RecordingReporter>,
) -> SessionController {
    let reporter: Arc<dyn StatusReporter> = reporter;
    SessionController::new(
        ProviderAdapter::new(provider, POLL_INTERVAL),
        TEST_CONTRACT,
        reporter,
    )
}

pub fn orchestrator_with(
    wallet: &Arc<FakeWallet>,
    reporter: Arc<RecordingReporter>,
    submission_latch: bool,
) -> (Arc<SessionController>, TransactionOrchestrator) {
    let session = Arc::new(session_with(wallet.provider(), reporter.clone()));
    let reporter: Arc<dyn StatusReporter> = reporter;
    let orchestrator = TransactionOrchestrator::new(session.clone(), reporter, submission_latch);
    (session, orchestrator)
}
