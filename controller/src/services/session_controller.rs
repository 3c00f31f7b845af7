//! # Session Controller Service
//!
//! Owns the wallet session: whether the controller is connected and, if so,
//! the contract handle every other operation uses.
//!
//! ## States
//!
//! ```text
//!   Disconnected ──connect() ok──▶ Connected(handle)
//!        │                              │
//!   connect() err                  connect() ok → rebind (new handle)
//!        │                         connect() err → keep current handle
//!        ▼
//!   Disconnected
//! ```
//!
//! There is no disconnect transition.

use std::sync::Arc;

use alloy::primitives::Address;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::contract::ContractHandle;
use crate::provider::{ProviderAdapter, ProviderError};
use crate::status::{StateChange, StatusEvent, StatusReporter};

/// Whether a wallet session is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// The session itself. A contract handle exists exactly when connected.
#[derive(Clone, Default)]
pub enum Session {
    #[default]
    Disconnected,
    Connected(ContractHandle),
}

impl Session {
    pub fn state(&self) -> ConnectionState {
        match self {
            Session::Disconnected => ConnectionState::Disconnected,
            Session::Connected(_) => ConnectionState::Connected,
        }
    }

    pub fn contract(&self) -> Option<&ContractHandle> {
        match self {
            Session::Disconnected => None,
            Session::Connected(handle) => Some(handle),
        }
    }
}

/// Establishes and holds the wallet session.
pub struct SessionController {
    /// Source of signing handles.
    adapter: ProviderAdapter,

    /// The fixed ledger contract.
    contract_address: Address,

    /// Current session. Only `connect()` writes it.
    session: RwLock<Session>,

    /// Where status events go.
    reporter: Arc<dyn StatusReporter>,
}

impl SessionController {
    /// Create a controller in the `Disconnected` state.
    pub fn new(
        adapter: ProviderAdapter,
        contract_address: Address,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            adapter,
            contract_address,
            session: RwLock::new(Session::Disconnected),
            reporter,
        }
    }

    /// Connect the wallet and bind the ledger contract.
    ///
    /// Safe to call while connected: a successful call rebinds to whatever
    /// account the wallet authorizes now, a failed one leaves the current
    /// session alone. Transactions already in flight keep their old handle.
    ///
    /// Never fails; the outcome is reported as a status event and returned.
    pub async fn connect(&self) -> StatusEvent {
        match self.adapter.connect().await {
            Ok(signer) => {
                let handle = ContractHandle::bind(self.contract_address, signer);
                let account = handle.account();

                *self.session.write().await = Session::Connected(handle);

                info!("🔗 Connected {} to contract {}", account, self.contract_address);
                self.reporter
                    .state_changed(&StateChange::Connected(account.to_string()));
                self.emit(StatusEvent::success("Wallet connected successfully!"))
            }
            Err(ProviderError::NoProvider) => {
                warn!("Connect requested but no wallet provider is present");
                self.emit(StatusEvent::error("Please install Metamask!"))
            }
            Err(e) => {
                error!("Wallet connection failed: {}", e);
                self.emit(StatusEvent::error("Failed to connect wallet. Please try again."))
            }
        }
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        self.session.read().await.state()
    }

    /// The bound contract, if connected.
    pub async fn contract(&self) -> Option<ContractHandle> {
        self.session.read().await.contract().cloned()
    }

    /// Address of the ledger contract.
    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    /// The provider adapter (for health checks).
    pub fn adapter(&self) -> &ProviderAdapter {
        &self.adapter
    }

    fn emit(&self, event: StatusEvent) -> StatusEvent {
        self.reporter.report(&event);
        event
    }
}
