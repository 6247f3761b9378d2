use std::{fmt, result};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("not connected")]
    NotConnected,
    #[error("invalid account")]
    InvalidAccount,
    #[error("invalid chain: {0}")]
    InvalidChain(String),
    #[error("conflicting chain: expected {expected}, found {found}")]
    ConflictingChain { expected: String, found: String },

    /// The native host answered with an explicit error payload.
    #[error("host error: {0}")]
    Host(String),
    #[error("host did not answer {method} within {after_ms} ms")]
    Timeout { method: String, after_ms: u64 },
    #[error("request {0} was dropped before the host answered")]
    Cancelled(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid response from host: {0}")]
    InvalidResponse(String),
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("bridge dispatcher is already listening")]
    AlreadyListening,
    #[error("wallet is already registered")]
    AlreadyRegistered,
}

pub type Result<T> = result::Result<T, BridgeError>;

impl BridgeError {
    pub fn invalid_response<T: fmt::Display>(inner: T) -> Self {
        Self::InvalidResponse(inner.to_string())
    }
    pub fn encoding<T: fmt::Display>(inner: T) -> Self {
        Self::Encoding(inner.to_string())
    }
    pub fn transport<T: fmt::Display>(inner: T) -> Self {
        Self::Transport(inner.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(value: serde_json::Error) -> Self {
        BridgeError::Encoding(value.to_string())
    }
}

impl From<bs58::decode::Error> for BridgeError {
    fn from(value: bs58::decode::Error) -> Self {
        BridgeError::Encoding(format!("base58: {}", value))
    }
}

impl From<bincode::Error> for BridgeError {
    fn from(value: bincode::Error) -> Self {
        BridgeError::Encoding(format!("bincode: {}", value))
    }
}
