//! Error types for the counter dashboard.

use thiserror::Error;

/// Errors from the strict (full-precision) value decoder.
///
/// The lossy display decoder never produces these; it degrades to a
/// fallback string instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("value is absent")]
    Absent,

    #[error("negative value {value} has no unsigned form")]
    Negative { value: String },

    #[error("not an integer: {value}")]
    NotAnInteger { value: String },

    #[error("u256 limb '{limb}' out of range: {value}")]
    LimbOutOfRange { limb: &'static str, value: String },

    #[error("value exceeds 256 bits")]
    Overflow,

    #[error("no numeric field found in object with keys {{{keys}}}")]
    NoNumericField { keys: String },
}

/// Errors reported by a `ContractClient` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("contract '{contract}' is not deployed")]
    UnknownContract { contract: String },

    #[error("contract '{contract}' has no function '{function}'")]
    UnknownFunction { contract: String, function: String },

    #[error("call {contract}.{function} reverted: {reason}")]
    Reverted {
        contract: String,
        function: String,
        reason: String,
    },

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("receipt for {tx_hash} failed: {reason}")]
    Receipt { tx_hash: String, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the dashboard controller and history loader.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// A view call failed. Shown inline as "failed"; never retried.
    #[error("read {function} failed: {source}")]
    Read {
        function: String,
        #[source]
        source: ClientError,
    },

    /// A transaction could not be submitted or confirmed. The caller logs
    /// it and leaves the displayed state untouched.
    #[error("{action} failed: {source}")]
    Write {
        action: &'static str,
        #[source]
        source: ClientError,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("only the contract owner can {action}")]
    NotOwner { action: &'static str },

    #[error("contract '{contract}' is not deployed")]
    NotDeployed { contract: String },

    #[error("no receipt for {tx_hash} after {ms}ms")]
    ReceiptTimeout { tx_hash: String, ms: u64 },

    #[error("cancelled")]
    Cancelled,

    #[error("event history for {event} failed: {source}")]
    History {
        event: String,
        #[source]
        source: ClientError,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl DashboardError {
    /// `true` when the operation stopped because the owning component shut
    /// down, rather than because something went wrong.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DashboardError::Cancelled)
    }
}
