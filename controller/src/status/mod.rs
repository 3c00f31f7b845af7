//! # Status Module
//!
//! Everything the controller tells the presentation layer goes through
//! [`StatusReporter`]: transient toast-style status events, and state
//! changes the UI should re-render.
//!
//! ## Message Format
//!
//! ```json
//! {
//!     "id": "550e8400-e29b-41d4-a716-446655440000",
//!     "message": "Deposit successful!",
//!     "severity": "success",
//!     "timestamp": "2024-01-15T12:00:00Z"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// A one-shot notification for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub id: Uuid,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl StatusEvent {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            timestamp: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }
}

/// A change to state the UI displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum StateChange {
    /// The session is now bound to this account.
    Connected(String),
    /// Stored balance, in wei.
    Balance(String),
    /// Pending amount input.
    Amount(String),
    /// Persistent error line.
    ErrorMessage(Option<String>),
}

/// Receiver of status events and state changes.
///
/// Called synchronously from controller operations; implementations must
/// not block.
pub trait StatusReporter: Send + Sync {
    /// Show a status event to the user.
    fn report(&self, event: &StatusEvent);

    /// Re-render after a state change.
    fn state_changed(&self, _change: &StateChange) {}
}
