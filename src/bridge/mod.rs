pub mod protocol;
pub mod transport;
pub mod client;

pub use protocol::{ConnectConfig, HostRequest, MessageEncoding, SendOptions};
pub use transport::{ChannelTransport, HostTransport};
pub use client::{
    BridgeClient, ProviderEvent, ProviderEventName, ProviderSubscription, SignedMessage,
    SubmittedTransaction,
};
