//! # Transaction Orchestrator Service
//!
//! Owns the displayed ledger state (balance, pending amount, error line) and
//! runs the three contract operations against the session's handle.
//!
//! ## Flow: Deposit / Withdraw
//!
//! ```text
//! 1. Session connected? no → do nothing
//!                ↓
//! 2. Convert amount (ether) → wei
//!                ↓
//! 3. write(depositCall | withdrawCall) → wallet signs + broadcasts
//!                ↓
//! 4. Wait for the receipt
//!                ↓
//! 5. Clear amount, fetch_balance(), report success
//! ```
//!
//! Any failure is reported as a status event; nothing is returned as an
//! error. Only a failed withdrawal sets the persistent error line.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::session_controller::SessionController;
use crate::contract::{ContractCall, ContractError, ContractHandle, ILedger};
use crate::provider::TransactionReceipt;
use crate::status::{StateChange, StatusEvent, StatusReporter};
use crate::utils::{self, UnitsError};

/// Error line shown when a withdrawal fails without a revert reason.
const GENERIC_FAILURE: &str = "Transaction failed";

/// Errors from a deposit or withdrawal attempt.
#[derive(Debug, Error)]
enum SubmitError {
    #[error(transparent)]
    Amount(#[from] UnitsError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl SubmitError {
    fn reason(&self) -> Option<&str> {
        match self {
            SubmitError::Amount(_) => None,
            SubmitError::Contract(e) => e.reason(),
        }
    }
}

/// Ledger state owned by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LedgerState {
    /// Last balance read from the contract, in wei.
    balance: String,
    /// Pending user input, in ether.
    amount: String,
    /// Last withdrawal failure.
    error_message: Option<String>,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            balance: "0".to_string(),
            amount: String::new(),
            error_message: None,
        }
    }
}

/// Everything the UI renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSnapshot {
    pub connected: bool,
    pub account: Option<Address>,
    pub contract_address: Address,
    /// Balance in wei.
    pub balance: String,
    /// Balance in ether.
    pub formatted_balance: String,
    pub amount: String,
    pub error_message: Option<String>,
}

/// Releases the submission latch when dropped.
struct SubmissionGuard<'a>(Option<&'a AtomicBool>);

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        if let Some(flag) = self.0 {
            flag.store(false, Ordering::Release);
        }
    }
}

/// Runs balance reads, deposits and withdrawals.
pub struct TransactionOrchestrator {
    /// Session providing the contract handle.
    session: Arc<SessionController>,

    /// Balance / amount / error line.
    state: Mutex<LedgerState>,

    /// Where status events go.
    reporter: Arc<dyn StatusReporter>,

    /// Reject overlapping writes when set.
    submission_latch: bool,

    /// A deposit or withdrawal is in flight (latch only).
    in_flight: AtomicBool,
}

impl TransactionOrchestrator {
    /// Create an orchestrator with a zero balance and empty input.
    pub fn new(
        session: Arc<SessionController>,
        reporter: Arc<dyn StatusReporter>,
        submission_latch: bool,
    ) -> Self {
        Self {
            session,
            state: Mutex::new(LedgerState::default()),
            reporter,
            submission_latch,
            in_flight: AtomicBool::new(false),
        }
    }

    // ==========================================
    // STATE
    // ==========================================

    /// Replace the pending amount input.
    pub async fn set_amount(&self, amount: impl Into<String>) {
        let amount = amount.into();
        self.state.lock().await.amount = amount.clone();
        self.reporter.state_changed(&StateChange::Amount(amount));
    }

    /// Pending amount input.
    pub async fn amount(&self) -> String {
        self.state.lock().await.amount.clone()
    }

    /// Last balance read, in wei.
    pub async fn balance(&self) -> String {
        self.state.lock().await.balance.clone()
    }

    /// Last withdrawal failure, if any.
    pub async fn error_message(&self) -> Option<String> {
        self.state.lock().await.error_message.clone()
    }

    /// Current view of session and ledger state.
    pub async fn snapshot(&self) -> ControllerSnapshot {
        let contract = self.session.contract().await;
        let state = self.state.lock().await.clone();

        let formatted_balance = state
            .balance
            .parse::<U256>()
            .map(utils::format_ether)
            .unwrap_or_else(|_| state.balance.clone());

        ControllerSnapshot {
            connected: contract.is_some(),
            account: contract.as_ref().map(ContractHandle::account),
            contract_address: self.session.contract_address(),
            balance: state.balance,
            formatted_balance,
            amount: state.amount,
            error_message: state.error_message,
        }
    }

    // ==========================================
    // OPERATIONS
    // ==========================================

    /// Read the contract balance and store it.
    ///
    /// Returns `None` (and does nothing) while disconnected.
    pub async fn fetch_balance(&self) -> Option<StatusEvent> {
        let Some(contract) = self.session.contract().await else {
            debug!("fetch_balance ignored: wallet not connected");
            return None;
        };

        Some(self.refresh_balance(&contract).await)
    }

    /// Deposit `amount` ether into the contract.
    ///
    /// Returns `None` (and does nothing) while disconnected.
    pub async fn deposit(&self, amount: &str) -> Option<StatusEvent> {
        let Some(contract) = self.session.contract().await else {
            debug!("deposit ignored: wallet not connected");
            return None;
        };

        let Some(_guard) = self.begin_submission() else {
            return Some(self.emit(StatusEvent::info("A transaction is already in progress")));
        };

        info!("Processing deposit: {} ETH from {}", amount, contract.account());

        let deposit = |amount| ILedger::depositCall { amount };
        match self.submit(&contract, deposit, amount, true).await {
            Ok(receipt) => {
                let block = receipt.block_number.unwrap_or_default();
                info!("✅ Deposit mined in block {}", block);
                self.settle(&contract).await;
                Some(self.emit(StatusEvent::success("Deposit successful!")))
            }
            Err(e) => {
                error!("Deposit failed: {}", e);
                Some(self.emit(StatusEvent::error("Deposit failed")))
            }
        }
    }

    /// Withdraw `amount` ether from the contract.
    ///
    /// On failure the revert reason (or a generic message) is stored as the
    /// error line and reported with the same text.
    ///
    /// Returns `None` (and does nothing) while disconnected.
    pub async fn withdraw(&self, amount: &str) -> Option<StatusEvent> {
        let Some(contract) = self.session.contract().await else {
            debug!("withdraw ignored: wallet not connected");
            return None;
        };

        let Some(_guard) = self.begin_submission() else {
            return Some(self.emit(StatusEvent::info("A transaction is already in progress")));
        };

        info!("Processing withdrawal: {} ETH to {}", amount, contract.account());

        let withdraw = |amount| ILedger::withdrawCall { amount };
        match self.submit(&contract, withdraw, amount, false).await {
            Ok(receipt) => {
                let block = receipt.block_number.unwrap_or_default();
                info!("✅ Withdrawal mined in block {}", block);
                self.settle(&contract).await;
                Some(self.emit(StatusEvent::success("Withdrawal successful!")))
            }
            Err(e) => {
                error!("Withdrawal failed: {}", e);
                let message = e.reason().unwrap_or(GENERIC_FAILURE).to_string();

                self.state.lock().await.error_message = Some(message.clone());
                self.reporter
                    .state_changed(&StateChange::ErrorMessage(Some(message.clone())));

                Some(self.emit(StatusEvent::error(message)))
            }
        }
    }

    // ==========================================
    // INTERNALS
    // ==========================================

    async fn refresh_balance(&self, contract: &ContractHandle) -> StatusEvent {
        match contract.read(ILedger::getBalanceCall {}).await {
            Ok(balance) => {
                let balance_str = balance.to_string();
                self.state.lock().await.balance = balance_str.clone();
                self.reporter.state_changed(&StateChange::Balance(balance_str));

                debug!("Balance: {} wei", balance);
                self.emit(StatusEvent::info(format!(
                    "Balance fetched: {} ETH",
                    utils::format_ether(balance)
                )))
            }
            Err(e) => {
                warn!("Failed to fetch balance: {}", e);
                self.emit(StatusEvent::error("Failed to fetch balance"))
            }
        }
    }

    /// Convert, send and wait. `attach_value` sends the amount as native
    /// currency alongside the argument.
    async fn submit<C: ContractCall>(
        &self,
        contract: &ContractHandle,
        call: impl FnOnce(U256) -> C,
        amount: &str,
        attach_value: bool,
    ) -> Result<TransactionReceipt, SubmitError> {
        let wei = utils::parse_ether(amount)?;
        let value = attach_value.then_some(wei);

        let pending = contract.write(call(wei), value).await?;
        debug!("{} submitted as {}", C::SIGNATURE, pending.hash());
        Ok(pending.wait().await?)
    }

    /// Post-transaction reconciliation: clear input, then re-read the
    /// balance from the same handle that sent the transaction.
    async fn settle(&self, contract: &ContractHandle) {
        self.state.lock().await.amount.clear();
        self.reporter.state_changed(&StateChange::Amount(String::new()));
        self.refresh_balance(contract).await;
    }

    fn begin_submission(&self) -> Option<SubmissionGuard<'_>> {
        if !self.submission_latch {
            return Some(SubmissionGuard(None));
        }

        if self.in_flight.swap(true, Ordering::AcqRel) {
            warn!("Rejected overlapping submission");
            return None;
        }

        Some(SubmissionGuard(Some(&self.in_flight)))
    }

    fn emit(&self, event: StatusEvent) -> StatusEvent {
        self.reporter.report(&event);
        event
    }
}
