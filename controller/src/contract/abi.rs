//! # Ledger Contract Interface
//!
//! The ledger contract's ABI is declared with `sol!`, which generates one
//! typed call struct per function. Selectors, calldata and return decoding
//! come from those types. This module adds the two things the bindings do
//! not carry: each call's state mutability, and recovery of `Error(string)`
//! revert reasons from failed provider requests.
//!
//! | Call | Selector | Mutability |
//! |------|----------|------------|
//! | `getBalance()` | `0x12065fe0` | view |
//! | `deposit(uint256)` | `0xb6b55f25` | payable |
//! | `withdraw(uint256)` | `0x2e1a7d4d` | nonpayable |

use alloy::hex;
use alloy::sol;
use alloy::sol_types::{Revert, SolCall, SolError};
use serde_json::Value;

use crate::provider::RpcError;

/// Prefix nodes put in front of a revert reason in error messages.
const REVERTED_PREFIX: &str = "execution reverted:";

sol! {
    /// Per-account ether ledger.
    interface ILedger {
        function getBalance() external view returns (uint256);
        function deposit(uint256 amount) external payable;
        function withdraw(uint256 amount) external;
    }
}

/// How a function interacts with contract state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateMutability {
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    /// Whether calling the function requires a transaction.
    pub fn is_write(self) -> bool {
        matches!(self, StateMutability::NonPayable | StateMutability::Payable)
    }
}

/// A call on the bound contract, with its declared mutability.
pub trait ContractCall: SolCall {
    const MUTABILITY: StateMutability;
}

impl ContractCall for ILedger::getBalanceCall {
    const MUTABILITY: StateMutability = StateMutability::View;
}

impl ContractCall for ILedger::depositCall {
    const MUTABILITY: StateMutability = StateMutability::Payable;
}

impl ContractCall for ILedger::withdrawCall {
    const MUTABILITY: StateMutability = StateMutability::NonPayable;
}

/// Decode an `Error(string)` revert payload.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    Revert::abi_decode(data).ok().map(|revert| revert.reason)
}

/// Extract a human-readable revert reason from a failed provider request.
///
/// Looks at the error's `data` first (hex `Error(string)` payload, possibly
/// nested as `{ "data": "0x..." }`), then at a message of the form
/// `execution reverted: <reason>`.
pub fn revert_reason(error: &RpcError) -> Option<String> {
    let RpcError::Rpc { message, data, .. } = error else {
        return None;
    };

    let payload = data.as_ref().and_then(|data| match data {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("data").and_then(Value::as_str),
        _ => None,
    });

    if let Some(reason) = payload
        .and_then(|hex_data| hex::decode(hex_data).ok())
        .and_then(|bytes| decode_revert_reason(&bytes))
    {
        return Some(reason);
    }

    message
        .find(REVERTED_PREFIX)
        .map(|idx| message[idx + REVERTED_PREFIX.len()..].trim().to_string())
        .filter(|reason| !reason.is_empty())
}

/// Encode an `Error(string)` revert payload.
#[cfg(test)]
pub(crate) fn encode_revert_reason(reason: &str) -> Vec<u8> {
    Revert {
        reason: reason.to_string(),
    }
    .abi_encode()
}
