// src/account.rs
use crate::error::{BridgeError, Result};
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

/// The account the host is currently signing for.
///
/// Address and key bytes are both derived from the one `Pubkey`, so they can
/// never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Account {
    public_key: Pubkey,
}

impl Account {
    pub fn new(public_key: Pubkey) -> Self {
        Self { public_key }
    }

    /// Parse a base58 public key as sent by the host
    pub fn from_base58(public_key: &str) -> Result<Self> {
        let public_key = Pubkey::from_str(public_key.trim()).map_err(|e| {
            BridgeError::invalid_response(format!("invalid public key {:?}: {}", public_key, e))
        })?;
        Ok(Self::new(public_key))
    }

    pub fn public_key(&self) -> Pubkey {
        self.public_key
    }

    /// Base58-encoded Solana address
    pub fn address(&self) -> String {
        self.public_key.to_string()
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.public_key.to_bytes()
    }
}

impl From<Pubkey> for Account {
    fn from(public_key: Pubkey) -> Self {
        Self::new(public_key)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.public_key)
    }
}
