// Wallet standard identifiers, chains and static feature metadata

use base64::Engine;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

pub const STANDARD_CONNECT: &str = "standard:connect";
pub const STANDARD_DISCONNECT: &str = "standard:disconnect";
pub const STANDARD_EVENTS: &str = "standard:events";
pub const SOLANA_SIGN_AND_SEND_TRANSACTION: &str = "solana:signAndSendTransaction";
pub const SOLANA_SIGN_TRANSACTION: &str = "solana:signTransaction";
pub const SOLANA_SIGN_MESSAGE: &str = "solana:signMessage";

/// Wallet specific feature exposing the underlying bridge provider
pub const UNRUGGABLE_NAMESPACE: &str = "unruggable:";

pub const FEATURE_VERSION: &str = "1.0.0";
pub const WALLET_VERSION: &str = "1.0.0";

/// Features an account can be used with
pub const ACCOUNT_FEATURES: [&str; 3] = [
    SOLANA_SIGN_AND_SEND_TRANSACTION,
    SOLANA_SIGN_TRANSACTION,
    SOLANA_SIGN_MESSAGE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolanaChain {
    #[serde(rename = "solana:mainnet")]
    Mainnet,
    #[serde(rename = "solana:devnet")]
    Devnet,
    #[serde(rename = "solana:testnet")]
    Testnet,
    #[serde(rename = "solana:localnet")]
    Localnet,
}

impl SolanaChain {
    pub const ALL: [SolanaChain; 4] = [
        SolanaChain::Mainnet,
        SolanaChain::Devnet,
        SolanaChain::Testnet,
        SolanaChain::Localnet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SolanaChain::Mainnet => "solana:mainnet",
            SolanaChain::Devnet => "solana:devnet",
            SolanaChain::Testnet => "solana:testnet",
            SolanaChain::Localnet => "solana:localnet",
        }
    }
}

impl FromStr for SolanaChain {
    type Err = BridgeError;

    fn from_str(chain: &str) -> Result<Self, Self::Err> {
        SolanaChain::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == chain)
            .ok_or_else(|| BridgeError::InvalidChain(chain.to_string()))
    }
}

impl fmt::Display for SolanaChain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_solana_chain(chain: &str) -> bool {
    chain.parse::<SolanaChain>().is_ok()
}

/// Transaction versions accepted by the signing features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionVersion {
    Legacy,
    V0,
}

impl Serialize for TransactionVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TransactionVersion::Legacy => serializer.serialize_str("legacy"),
            TransactionVersion::V0 => serializer.serialize_u8(0),
        }
    }
}

pub const SUPPORTED_TRANSACTION_VERSIONS: [TransactionVersion; 2] =
    [TransactionVersion::Legacy, TransactionVersion::V0];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDescriptor {
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_transaction_versions: Option<Vec<TransactionVersion>>,
}

impl FeatureDescriptor {
    fn plain() -> Self {
        Self {
            version: FEATURE_VERSION,
            supported_transaction_versions: None,
        }
    }

    fn transactional() -> Self {
        Self {
            version: FEATURE_VERSION,
            supported_transaction_versions: Some(SUPPORTED_TRANSACTION_VERSIONS.to_vec()),
        }
    }
}

/// Capability map announced to pages
pub fn wallet_features() -> BTreeMap<&'static str, FeatureDescriptor> {
    BTreeMap::from([
        (STANDARD_CONNECT, FeatureDescriptor::plain()),
        (STANDARD_DISCONNECT, FeatureDescriptor::plain()),
        (STANDARD_EVENTS, FeatureDescriptor::plain()),
        (SOLANA_SIGN_AND_SEND_TRANSACTION, FeatureDescriptor::transactional()),
        (SOLANA_SIGN_TRANSACTION, FeatureDescriptor::transactional()),
        (SOLANA_SIGN_MESSAGE, FeatureDescriptor::plain()),
        (UNRUGGABLE_NAMESPACE, FeatureDescriptor::plain()),
    ])
}

const ICON_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="128" height="128" viewBox="0 0 128 128"><rect width="128" height="128" rx="28" fill="#0b0b0f"/><path d="M36 34h16v40a12 12 0 0 0 24 0V34h16v40a28 28 0 0 1-56 0z" fill="#f5f5f7"/></svg>"##;

/// Built-in wallet icon as a data URI
pub fn default_icon() -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(ICON_SVG)
    )
}
