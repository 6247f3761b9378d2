use serde::Serialize;

use crate::account::Account;
use crate::standard::features::{SolanaChain, ACCOUNT_FEATURES};

/// The account as published to pages through the wallet standard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAccount {
    address: String,
    public_key: [u8; 32],
    chains: Vec<SolanaChain>,
    features: Vec<&'static str>,
}

impl WalletAccount {
    pub fn new(account: Account) -> Self {
        Self {
            address: account.address(),
            public_key: account.public_key_bytes(),
            chains: SolanaChain::ALL.to_vec(),
            features: ACCOUNT_FEATURES.to_vec(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }

    pub fn chains(&self) -> &[SolanaChain] {
        &self.chains
    }

    pub fn features(&self) -> &[&'static str] {
        &self.features
    }

    /// Same address and same key bytes
    pub fn same_identity(&self, other: &WalletAccount) -> bool {
        self.address == other.address && self.public_key == other.public_key
    }
}

impl From<Account> for WalletAccount {
    fn from(account: Account) -> Self {
        Self::new(account)
    }
}
