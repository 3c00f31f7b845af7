//! # Configuration Module
//!
//! This module handles loading and validating configuration from
//! environment variables. All settings are centralized here.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = AppConfig::from_env()?;
//! println!("Contract: {}", config.contract_address);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Description | Example |
//! |----------|-------------|---------|
//! | `WALLET_PROVIDER_URL` | Wallet JSON-RPC endpoint (unset = no wallet) | `http://127.0.0.1:8545` |
//! | `CONTRACT_ADDRESS` | Deployed ledger contract | `0x94a39Ee9df78...` |
//! | `RECEIPT_POLL_INTERVAL_MS` | Finalization polling cadence | `1000` |
//! | `SUBMISSION_LATCH` | Reject overlapping deposit/withdraw | `false` |
//! | `SERVER_HOST` | HTTP server host | `127.0.0.1` |
//! | `SERVER_PORT` | HTTP server port | `8080` |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use thiserror::Error;

/// The ledger contract the controller binds to unless overridden.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x94a39Ee9df7823312b869b8d81E152493B1df810";

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    /// Failed to parse a value
    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

/// Application configuration loaded from environment variables.
///
/// Values are read once at startup; the contract address in particular is
/// fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // ==========================================
    // WALLET SETTINGS
    // ==========================================

    /// JSON-RPC endpoint of the wallet provider.
    ///
    /// `None` models a page without an injected wallet: connecting
    /// fails immediately without touching the network.
    pub wallet_provider_url: Option<String>,

    /// Address of the deployed ledger contract.
    pub contract_address: Address,

    /// How often to poll for a transaction receipt (milliseconds).
    ///
    /// There is no overall timeout; polling continues until the
    /// transaction is mined.
    pub receipt_poll_interval_ms: u64,

    /// Reject a deposit/withdraw while another one is still in flight.
    pub submission_latch: bool,

    // ==========================================
    // SERVER SETTINGS
    // ==========================================

    /// HTTP server host address.
    pub server_host: String,

    /// HTTP server port number.
    ///
    /// Default: 8080
    pub server_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Use `dotenvy::dotenv()` before calling this to load from `.env` file.
    ///
    /// ## Returns
    ///
    /// - `Ok(AppConfig)` - Configuration loaded successfully
    /// - `Err(ConfigError)` - A variable is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        let contract_address = get_env_or_default("CONTRACT_ADDRESS", DEFAULT_CONTRACT_ADDRESS);

        Ok(Self {
            // Wallet
            wallet_provider_url: get_optional_env("WALLET_PROVIDER_URL"),
            contract_address: Address::from_str(&contract_address).map_err(|e| {
                ConfigError::InvalidValue("CONTRACT_ADDRESS".to_string(), e.to_string())
            })?,
            receipt_poll_interval_ms: get_env_or_default("RECEIPT_POLL_INTERVAL_MS", "1000")
                .parse()
                .map_err(|e| ConfigError::ParseError(
                    "RECEIPT_POLL_INTERVAL_MS".to_string(),
                    format!("{}", e),
                ))?,
            submission_latch: parse_flag(
                "SUBMISSION_LATCH",
                &get_env_or_default("SUBMISSION_LATCH", "false"),
            )?,

            // Server
            server_host: get_env_or_default("SERVER_HOST", "127.0.0.1"),
            server_port: get_env_or_default("SERVER_PORT", "8080")
                .parse()
                .map_err(|e| ConfigError::ParseError(
                    "SERVER_PORT".to_string(),
                    format!("{}", e),
                ))?,
        })
    }

    /// Receipt polling interval as a `Duration`.
    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

/// Get an environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
///
/// Returns the default if the variable is not set.
fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean switch such as `SUBMISSION_LATCH=true`.
fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue(key.to_string(), other.to_string())),
    }
}
