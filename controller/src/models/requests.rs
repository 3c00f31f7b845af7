//! # API Request Models
//!
//! Structures for incoming API request bodies.

use serde::{Deserialize, Serialize};

/// Request to replace the pending amount input.
///
/// ## Example JSON
///
/// ```json
/// { "amount": "1.5" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAmountRequest {
    /// Amount in ether, as typed by the user. Not validated here.
    pub amount: String,
}

/// Request to deposit or withdraw.
///
/// ## Example JSON
///
/// ```json
/// { "amount": "2" }
/// ```
///
/// An empty body (or `{}`) submits the current amount input instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAmountRequest {
    /// Amount in ether. Falls back to the stored input when absent.
    #[serde(default)]
    pub amount: Option<String>,
}
