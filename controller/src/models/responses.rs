//! # API Response Models
//!
//! Structures for outgoing API response bodies.
//! All responses are wrapped in a standard format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::{ConnectionState, ControllerSnapshot};
use crate::status::StatusEvent;

/// Standard API response wrapper.
///
/// ## Success Response
///
/// ```json
/// {
///     "success": true,
///     "data": { ... },
///     "error": null
/// }
/// ```
///
/// ## Error Response
///
/// ```json
/// {
///     "success": false,
///     "data": null,
///     "error": {
///         "code": "WALLET_NOT_CONNECTED",
///         "message": "Connect a wallet first"
///     }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the request was successful.
    pub success: bool,

    /// Response data (null on error).
    pub data: Option<T>,

    /// Error information (null on success).
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// API error information.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Error code (e.g., "WALLET_NOT_CONNECTED").
    pub code: String,

    /// Human-readable error message.
    pub message: String,
}

/// Result of a controller operation.
///
/// Carries the status event the operation emitted and the state after it.
///
/// ## Example Response
///
/// ```json
/// {
///     "success": true,
///     "data": {
///         "status": {
///             "id": "550e8400-e29b-41d4-a716-446655440000",
///             "message": "insufficient funds",
///             "severity": "error",
///             "timestamp": "2024-01-15T12:00:00Z"
///         },
///         "state": {
///             "connected": true,
///             "account": "0x0101010101010101010101010101010101010101",
///             "contractAddress": "0x94a39Ee9df7823312b869b8d81E152493B1df810",
///             "balance": "1000000000000000000",
///             "formattedBalance": "1",
///             "amount": "1000",
///             "errorMessage": "insufficient funds"
///         }
///     }
/// }
/// ```
///
/// A failed operation is still a successful request; the outcome is in
/// `status.severity`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    pub status: StatusEvent,
    pub state: ControllerSnapshot,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status: "healthy" or "degraded".
    pub status: String,

    /// Whether a wallet provider is configured.
    pub provider_available: bool,

    /// Chain id reported by the provider, if it answered.
    pub chain_id: Option<u64>,

    /// Wallet session state.
    pub session: ConnectionState,

    /// Open WebSocket connections.
    pub websocket_connections: usize,

    /// Service version.
    pub version: String,

    /// Current timestamp.
    pub timestamp: DateTime<Utc>,
}
