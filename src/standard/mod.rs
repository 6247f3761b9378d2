pub mod account;
pub mod features;
pub mod register;
pub mod wallet;

pub use account::WalletAccount;
pub use features::{wallet_features, FeatureDescriptor, SolanaChain, TransactionVersion};
pub use register::{initialize, install, installed, Installation, WalletRegistry};
pub use wallet::{
    ChangeEvent, ConnectInput, ConnectOutput, SignAndSendTransactionInput,
    SignAndSendTransactionOutput, SignMessageInput, SignMessageOutput, SignTransactionInput,
    SignTransactionOutput, StandardEventName, StandardSubscription, StandardWallet,
    WalletDescriptor,
};
