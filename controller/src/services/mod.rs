//! # Services Module
//!
//! The controller's business logic. Handlers and the WebSocket layer only
//! ever talk to these two services.
//!
//! | Service | Responsibility |
//! |---------|---------------|
//! | `SessionController` | Wallet connection, contract binding |
//! | `TransactionOrchestrator` | Balance reads, deposits, withdrawals, ledger state |
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                    SERVICES LAYER                      │
//! │                                                        │
//! │  ┌──────────────────┐      ┌───────────────────────┐   │
//! │  │SessionController │◀─────│TransactionOrchestrator│   │
//! │  │ • connect()      │handle│ • fetch_balance()     │   │
//! │  │ • contract()     │      │ • deposit()           │   │
//! │  └──────────────────┘      │ • withdraw()          │   │
//! │           │                └───────────────────────┘   │
//! │           ▼                           │                │
//! │     ProviderAdapter            StatusReporter          │
//! └───────────────────────────────────────────────────────┘
//! ```

pub mod session_controller;
pub mod transaction_orchestrator;

pub use session_controller::{ConnectionState, SessionController};
pub use transaction_orchestrator::{ControllerSnapshot, TransactionOrchestrator};
