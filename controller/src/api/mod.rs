//! # REST API Module
//!
//! The local HTTP surface a page uses to drive the controller.
//!
//! ## Endpoint Overview
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | API info |
//! | GET | `/health` | Provider / session health |
//! | GET | `/state` | Current controller state |
//! | POST | `/wallet/connect` | Connect wallet |
//! | GET | `/contract/balance` | Fetch contract balance |
//! | PUT | `/amount` | Set amount input |
//! | POST | `/contract/deposit` | Deposit |
//! | POST | `/contract/withdraw` | Withdraw |
//!
//! ## Request/Response Format
//!
//! ```json
//! // Success response
//! {
//!     "success": true,
//!     "data": { ... }
//! }
//!
//! // Error response
//! {
//!     "success": false,
//!     "error": {
//!         "code": "ERROR_CODE",
//!         "message": "Human readable message"
//!     }
//! }
//! ```

pub mod handlers;
pub mod routes;

pub use routes::configure_routes;
