use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

use serde::Serialize;

use crate::bridge::{
    BridgeClient, ConnectConfig, MessageEncoding, ProviderEvent, ProviderEventName,
    ProviderSubscription, SendOptions,
};
use crate::error::{BridgeError, Result};
use crate::events::{EventEmitter, Listener, Unsubscribe};
use crate::standard::account::WalletAccount;
use crate::standard::features::{
    default_icon, wallet_features, FeatureDescriptor, SolanaChain, WALLET_VERSION,
};
use crate::transaction::WalletTransaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardEventName {
    Change,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub accounts: Vec<WalletAccount>,
}

pub type StandardSubscription = Unsubscribe<StandardEventName, ChangeEvent>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectInput {
    /// Only reconnect if the page is already trusted; never prompt
    pub silent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectOutput {
    pub accounts: Vec<WalletAccount>,
}

#[derive(Debug, Clone)]
pub struct SignAndSendTransactionInput {
    pub account: WalletAccount,
    pub chain: String,
    /// Wire bytes, legacy or versioned
    pub transaction: Vec<u8>,
    pub options: Option<SendOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignAndSendTransactionOutput {
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SignTransactionInput {
    pub account: WalletAccount,
    pub chain: Option<String>,
    pub transaction: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignTransactionOutput {
    pub signed_transaction: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct SignMessageInput {
    pub account: WalletAccount,
    pub message: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignMessageOutput {
    pub signed_message: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Everything a page sees when it enumerates wallets
#[derive(Debug, Clone, Serialize)]
pub struct WalletDescriptor {
    pub version: &'static str,
    pub name: String,
    pub icon: String,
    pub chains: Vec<SolanaChain>,
    pub features: BTreeMap<&'static str, FeatureDescriptor>,
    pub accounts: Vec<WalletAccount>,
}

/// Presents the bridge provider as a wallet-standard wallet.
pub struct StandardWallet {
    provider: Arc<BridgeClient>,
    name: String,
    icon: String,
    account: Mutex<Option<WalletAccount>>,
    listeners: EventEmitter<StandardEventName, ChangeEvent>,
    subscriptions: Vec<ProviderSubscription>,
}

impl StandardWallet {
    pub fn new(provider: Arc<BridgeClient>) -> Arc<Self> {
        let config = provider.config().clone();
        let wallet = Arc::new_cyclic(|this: &Weak<StandardWallet>| {
            let subscriptions = vec![
                provider.on(ProviderEventName::Connect, forward(this, Self::connected)),
                provider.on(ProviderEventName::Disconnect, forward(this, Self::disconnected)),
                provider.on(ProviderEventName::AccountChanged, forward(this, Self::reconnected)),
            ];
            StandardWallet {
                provider: Arc::clone(&provider),
                name: config.wallet_name,
                icon: config.wallet_icon.unwrap_or_else(default_icon),
                account: Mutex::new(None),
                listeners: EventEmitter::new(),
                subscriptions,
            }
        });
        wallet.connected();
        wallet
    }

    pub fn version(&self) -> &'static str {
        WALLET_VERSION
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn chains(&self) -> Vec<SolanaChain> {
        SolanaChain::ALL.to_vec()
    }

    pub fn features(&self) -> BTreeMap<&'static str, FeatureDescriptor> {
        wallet_features()
    }

    /// The `unruggable:` feature: direct access to the bridge provider
    pub fn provider(&self) -> &Arc<BridgeClient> {
        &self.provider
    }

    pub fn accounts(&self) -> Vec<WalletAccount> {
        self.account().into_iter().collect()
    }

    fn account(&self) -> Option<WalletAccount> {
        self.account.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn descriptor(&self) -> WalletDescriptor {
        WalletDescriptor {
            version: self.version(),
            name: self.name.clone(),
            icon: self.icon.clone(),
            chains: self.chains(),
            features: self.features(),
            accounts: self.accounts(),
        }
    }

    pub fn on(
        &self,
        event: StandardEventName,
        listener: Listener<ChangeEvent>,
    ) -> StandardSubscription {
        self.listeners.on(event, listener)
    }

    fn emit_change(&self) {
        let event = ChangeEvent {
            accounts: self.accounts(),
        };
        self.listeners.emit(&StandardEventName::Change, &event);
    }

    /// Republish the provider's account; emits `change` only when the
    /// address or key bytes actually moved.
    fn connected(&self) {
        let Some(account) = self.provider.account() else {
            return;
        };
        let next = WalletAccount::from(account);
        let changed = {
            let mut published = self.account.lock().unwrap_or_else(|e| e.into_inner());
            match published.as_ref() {
                Some(current) if current.same_identity(&next) => false,
                _ => {
                    *published = Some(next);
                    true
                }
            }
        };
        if changed {
            log::info!("🔄 Wallet standard: account now {}", account);
            self.emit_change();
        }
    }

    fn disconnected(&self) {
        let removed = self
            .account
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some();
        if removed {
            self.emit_change();
        }
    }

    fn reconnected(&self) {
        if self.provider.account().is_some() {
            self.connected();
        } else {
            self.disconnected();
        }
    }

    pub async fn connect(&self, input: ConnectInput) -> Result<ConnectOutput> {
        if self.account().is_none() {
            let config = input.silent.then(ConnectConfig::only_if_trusted);
            self.provider.connect(config).await?;
        }
        self.connected();
        Ok(ConnectOutput {
            accounts: self.accounts(),
        })
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.provider.disconnect();
        Ok(())
    }

    fn published_account(&self) -> Result<WalletAccount> {
        self.account().ok_or(BridgeError::NotConnected)
    }

    /// One host request per input; the whole batch is validated first.
    pub async fn sign_and_send_transaction(
        &self,
        inputs: Vec<SignAndSendTransactionInput>,
    ) -> Result<Vec<SignAndSendTransactionOutput>> {
        let published = self.published_account()?;
        for input in &inputs {
            check_account(&published, &input.account)?;
        }
        common_chain(inputs.iter().map(|input| Some(input.chain.as_str())))?;
        let transactions = inputs
            .iter()
            .map(|input| WalletTransaction::from_wire_bytes(&input.transaction))
            .collect::<Result<Vec<_>>>()?;

        let mut outputs = Vec::with_capacity(inputs.len());
        for (input, transaction) in inputs.into_iter().zip(transactions) {
            // The account may have gone away while an earlier item was pending.
            check_account(&self.published_account()?, &input.account)?;
            let submitted = self
                .provider
                .sign_and_send_transaction(transaction, input.options)
                .await?;
            let signature = bs58::decode(&submitted.signature).into_vec()?;
            outputs.push(SignAndSendTransactionOutput { signature });
        }
        Ok(outputs)
    }

    /// A single input uses `sign_transaction`; several go to the host as one
    /// `sign_all_transactions` batch.
    pub async fn sign_transaction(
        &self,
        inputs: Vec<SignTransactionInput>,
    ) -> Result<Vec<SignTransactionOutput>> {
        let published = self.published_account()?;
        for input in &inputs {
            check_account(&published, &input.account)?;
        }
        common_chain(inputs.iter().map(|input| input.chain.as_deref()))?;
        let mut transactions = inputs
            .iter()
            .map(|input| WalletTransaction::from_wire_bytes(&input.transaction))
            .collect::<Result<Vec<_>>>()?;

        let signed = match transactions.len() {
            0 => Vec::new(),
            1 => {
                let transaction = transactions.remove(0);
                vec![self.provider.sign_transaction(transaction).await?]
            }
            _ => self.provider.sign_all_transactions(transactions).await?,
        };

        signed
            .iter()
            .map(|transaction| {
                Ok(SignTransactionOutput {
                    signed_transaction: transaction.to_wire_bytes()?,
                })
            })
            .collect()
    }

    pub async fn sign_message(&self, inputs: Vec<SignMessageInput>) -> Result<Vec<SignMessageOutput>> {
        let published = self.published_account()?;
        for input in &inputs {
            check_account(&published, &input.account)?;
        }

        let mut outputs = Vec::with_capacity(inputs.len());
        for input in inputs {
            check_account(&self.published_account()?, &input.account)?;
            let signed = self
                .provider
                .sign_message(&input.message, MessageEncoding::Utf8)
                .await?;
            outputs.push(SignMessageOutput {
                signed_message: input.message,
                signature: signed.signature,
            });
        }
        Ok(outputs)
    }
}

impl Drop for StandardWallet {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

fn forward(this: &Weak<StandardWallet>, handler: fn(&StandardWallet)) -> Listener<ProviderEvent> {
    let this = Weak::clone(this);
    Arc::new(move |_event: &ProviderEvent| {
        if let Some(wallet) = this.upgrade() {
            handler(&wallet);
        }
    })
}

fn check_account(published: &WalletAccount, requested: &WalletAccount) -> Result<()> {
    if published.same_identity(requested) {
        Ok(())
    } else {
        Err(BridgeError::InvalidAccount)
    }
}

/// Validate every chain present in a batch and require them to agree.
fn common_chain<'a>(chains: impl Iterator<Item = Option<&'a str>>) -> Result<Option<SolanaChain>> {
    let mut common: Option<SolanaChain> = None;
    for chain in chains.flatten() {
        let chain: SolanaChain = chain.parse()?;
        match common {
            Some(expected) if expected != chain => {
                return Err(BridgeError::ConflictingChain {
                    expected: expected.to_string(),
                    found: chain.to_string(),
                });
            }
            Some(_) => {}
            None => common = Some(chain),
        }
    }
    Ok(common)
}
