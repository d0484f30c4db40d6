// src/error.rs
//! Error taxonomy shared by the contract adapters, the view services and the API.
//!
//! Read-side failures of a single record never reach this type: the aggregator and
//! the view fan-outs recover them locally. What does surface here is either a
//! failure of a read that the caller depends on (owner, document record, ...) or a
//! submission failure, which is reported once and never retried.

use thiserror::Error;

/// Errors produced while talking to the registry contracts.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The RPC endpoint could not be reached or returned a transport error.
    #[error("provider error: {0}")]
    Provider(String),

    /// A contract call failed (revert on `eth_call`, ABI mismatch, decode error).
    #[error("contract call `{method}` failed: {message}")]
    Contract { method: String, message: String },

    /// Caller-supplied input could not be parsed (address, bytes32, level, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The signer declined to sign the transaction.
    #[error("transaction was rejected by the user")]
    Rejected,

    /// The transaction was mined but its execution reverted.
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    /// Any other submission failure (nonce, gas, network, dropped transaction).
    #[error("failed to {action}: {message}")]
    Submission { action: String, message: String },

    /// A mined transaction did not emit the event the caller relies on.
    #[error("{0} event not found in transaction receipt")]
    MissingEvent(String),

    /// A submission was requested but no signing session is configured.
    #[error("no signing session configured")]
    NoSession,

    /// The requested record does not exist on-chain.
    #[error("{0} not found")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// Builds a contract error for `method` from any displayable cause.
    pub fn contract(method: &str, cause: impl std::fmt::Display) -> Self {
        RegistryError::Contract {
            method: method.to_string(),
            message: cause.to_string(),
        }
    }

    /// Classifies a submission failure.
    ///
    /// Signers that ask a human for approval report a refusal as an error whose
    /// text contains "user rejected" or "denied"; those become [`RegistryError::Rejected`]
    /// so that the wording shown to the caller differs from a genuine failure.
    pub fn submission(action: &str, cause: impl std::fmt::Display) -> Self {
        let message = cause.to_string();
        let lowered = message.to_lowercase();
        if lowered.contains("user rejected") || lowered.contains("user denied") {
            RegistryError::Rejected
        } else {
            RegistryError::Submission {
                action: action.to_string(),
                message,
            }
        }
    }

    /// Whether the failure was caused by the signer refusing the request.
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, RegistryError::Rejected)
    }
}

impl From<config::ConfigError> for RegistryError {
    fn from(err: config::ConfigError) -> Self {
        RegistryError::Config(err.to_string())
    }
}

impl From<ethers::providers::ProviderError> for RegistryError {
    fn from(err: ethers::providers::ProviderError) -> Self {
        RegistryError::Provider(err.to_string())
    }
}
