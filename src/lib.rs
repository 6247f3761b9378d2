//! Bridge between a page running inside the Unruggable WebView and the
//! native wallet that hosts it.
//!
//! [`bridge::BridgeClient`] correlates requests and replies over the
//! message channel; [`standard::StandardWallet`] presents that client to
//! pages as a wallet-standard Solana wallet.

pub mod account;
pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod standard;
pub mod transaction;

#[cfg(test)]
mod testing;

pub use account::Account;
pub use bridge::{BridgeClient, ChannelTransport, HostTransport};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use standard::{StandardWallet, WalletRegistry};
pub use transaction::{TransactionKind, WalletTransaction};
