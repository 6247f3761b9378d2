use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::account::Account;
use crate::bridge::protocol::{
    BatchSignedReply, ConnectConfig, ConnectReply, HostBytes, HostRequest, InboundMessage,
    MessageEncoding, OutboundMessage, SendOptions, SignAndSendParams, SignAndSendReply,
    SignMessageReply, SignedTransactionReply,
};
use crate::bridge::transport::HostTransport;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::events::{EventEmitter, Listener, Unsubscribe};
use crate::transaction::{TransactionKind, WalletTransaction};

const REQUEST_ID_LEN: usize = 16;
const REQUEST_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

type Waiter = oneshot::Sender<Result<Value>>;
type PendingMap = Arc<Mutex<HashMap<String, Waiter>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEventName {
    Connect,
    Disconnect,
    AccountChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    Connect(Account),
    Disconnect,
    AccountChanged(Account),
}

impl ProviderEvent {
    pub fn name(&self) -> ProviderEventName {
        match self {
            ProviderEvent::Connect(_) => ProviderEventName::Connect,
            ProviderEvent::Disconnect => ProviderEventName::Disconnect,
            ProviderEvent::AccountChanged(_) => ProviderEventName::AccountChanged,
        }
    }
}

pub type ProviderSubscription = Unsubscribe<ProviderEventName, ProviderEvent>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub signature: Vec<u8>,
    pub public_key: Pubkey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    /// Base58 encoded on-chain transaction signature
    pub signature: String,
    pub public_key: Pubkey,
}

/// Removes a pending entry however the awaiting future ends: reply, timeout,
/// transport failure, or the caller dropping it.
struct PendingGuard {
    pending: PendingMap,
    request_id: String,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.remove(&self.request_id);
    }
}

/// Page-side provider that relays requests to the native host and matches
/// its replies by request id.
pub struct BridgeClient {
    transport: Arc<dyn HostTransport>,
    config: BridgeConfig,
    pending: PendingMap,
    account: Mutex<Option<Account>>,
    events: EventEmitter<ProviderEventName, ProviderEvent>,
    listening: AtomicBool,
}

impl BridgeClient {
    pub fn new(transport: Arc<dyn HostTransport>, config: BridgeConfig) -> Self {
        Self {
            transport,
            config,
            pending: Arc::new(Mutex::new(HashMap::new())),
            account: Mutex::new(None),
            events: EventEmitter::new(),
            listening: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn account(&self) -> Option<Account> {
        *self.account.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn public_key(&self) -> Option<Pubkey> {
        self.account().map(|account| account.public_key())
    }

    pub fn is_connected(&self) -> bool {
        self.account().is_some()
    }

    /// Number of requests still waiting on the host
    pub fn pending_requests(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn on(
        &self,
        event: ProviderEventName,
        listener: Listener<ProviderEvent>,
    ) -> ProviderSubscription {
        self.events.on(event, listener)
    }

    pub fn off(&self, event: ProviderEventName, listener: &Listener<ProviderEvent>) {
        self.events.off(&event, listener)
    }

    /// Drain `inbound` on a background task, dispatching every host message.
    /// Only one dispatcher may be installed per client.
    pub fn listen(
        self: &Arc<Self>,
        mut inbound: mpsc::UnboundedReceiver<String>,
    ) -> Result<JoinHandle<()>> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(BridgeError::AlreadyListening);
        }
        let client = Arc::downgrade(self);
        Ok(tokio::spawn(async move {
            while let Some(raw) = inbound.recv().await {
                let Some(client) = client.upgrade() else {
                    break;
                };
                client.dispatch(&raw);
            }
            log::info!("🔌 Bridge: inbound channel closed, dispatcher stopped");
        }))
    }

    /// Route one message from the host to the request waiting on it.
    ///
    /// Returns `true` when a pending request was settled. Unparseable text and
    /// unknown ids are dropped without touching other requests.
    pub fn dispatch(&self, raw: &str) -> bool {
        let message: InboundMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("⚠️  Bridge: dropping malformed host message: {}", e);
                return false;
            }
        };

        let Some(request_id) = message.request_id.clone() else {
            log::debug!("Bridge: ignoring host message without requestId");
            return false;
        };

        let waiter = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.remove(&request_id)
        };
        let Some(waiter) = waiter else {
            log::debug!("Bridge: no pending request for {}", request_id);
            return false;
        };

        let outcome = match message.error_message() {
            Some(error) => {
                log::warn!("❌ Bridge: host rejected {}: {}", request_id, error);
                Err(BridgeError::Host(error))
            }
            None => Ok(message.result.unwrap_or(Value::Null)),
        };
        if waiter.send(outcome).is_err() {
            log::debug!("Bridge: caller for {} went away before the reply", request_id);
        }
        true
    }

    fn register(&self, waiter: Waiter) -> String {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        let mut rng = rand::thread_rng();
        loop {
            let request_id: String = (0..REQUEST_ID_LEN)
                .map(|_| REQUEST_ID_ALPHABET[rng.gen_range(0..REQUEST_ID_ALPHABET.len())] as char)
                .collect();
            if !pending.contains_key(&request_id) {
                pending.insert(request_id.clone(), waiter);
                return request_id;
            }
        }
    }

    /// Send `request` to the host and wait for the reply carrying the same id.
    pub async fn send_request(&self, request: HostRequest) -> Result<Value> {
        let method = request.method();
        let (tx, rx) = oneshot::channel();
        let request_id = self.register(tx);
        let _guard = PendingGuard {
            pending: Arc::clone(&self.pending),
            request_id: request_id.clone(),
        };

        let text = serde_json::to_string(&OutboundMessage {
            request_id: request_id.clone(),
            data: request,
        })?;
        log::debug!("📤 Bridge: {} -> host ({})", method, request_id);
        self.transport.post_message(text)?;

        let outcome = match self.config.request_timeout() {
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    log::warn!("⏱️  Bridge: {} ({}) timed out", method, request_id);
                    return Err(BridgeError::Timeout {
                        method: method.to_string(),
                        after_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => rx.await,
        };

        match outcome {
            Ok(reply) => reply,
            Err(_) => Err(BridgeError::Cancelled(request_id)),
        }
    }

    pub async fn connect(&self, config: Option<ConnectConfig>) -> Result<Account> {
        log::info!(
            "🔗 Bridge: connect requested (only_if_trusted={})",
            config.map_or(false, |c| c.only_if_trusted)
        );
        let reply: ConnectReply =
            parse_reply("connect", self.send_request(HostRequest::Connect { config }).await?)?;
        let account = Account::from_base58(&reply.public_key)?;

        self.set_account(Some(account));
        log::info!("✅ Bridge: connected with {}", account);
        self.events
            .emit(&ProviderEventName::Connect, &ProviderEvent::Connect(account));
        Ok(account)
    }

    /// Forget the current account. Safe to call when already disconnected.
    pub fn disconnect(&self) {
        self.set_account(None);
        log::info!("👋 Bridge: disconnected");
        self.events
            .emit(&ProviderEventName::Disconnect, &ProviderEvent::Disconnect);
    }

    pub async fn sign_message(
        &self,
        message: &[u8],
        encoding: MessageEncoding,
    ) -> Result<SignedMessage> {
        log::debug!("✍️  Bridge: sign message ({} bytes)", message.len());
        let request = HostRequest::SignMessage {
            message: HostBytes::from(message),
            t: encoding,
        };
        let reply: SignMessageReply =
            parse_reply("sign_message", self.send_request(request).await?)?;
        let account = Account::from_base58(&reply.public_key)?;
        Ok(SignedMessage {
            signature: reply.signature.into_inner(),
            public_key: account.public_key(),
        })
    }

    pub async fn sign_transaction(&self, transaction: WalletTransaction) -> Result<WalletTransaction> {
        let kind = transaction.kind();
        log::debug!("✍️  Bridge: sign {:?} transaction", kind);
        let request = HostRequest::SignTransaction(transaction.encode()?);
        let reply: SignedTransactionReply =
            parse_reply("sign_transaction", self.send_request(request).await?)?;

        let (encoded, signatures) = match reply {
            SignedTransactionReply::Encoded(encoded) => (encoded, None),
            SignedTransactionReply::Versioned(reply) => {
                (reply.encoded_signed_transaction, reply.encoded_signed_signatures)
            }
        };
        WalletTransaction::decode(kind, &encoded, signatures.as_deref())
    }

    /// Sign and let the host submit. Nothing is broadcast from the page.
    pub async fn sign_and_send_transaction(
        &self,
        transaction: WalletTransaction,
        options: Option<SendOptions>,
    ) -> Result<SubmittedTransaction> {
        log::debug!("✍️  Bridge: sign and send {:?} transaction", transaction.kind());
        let request = HostRequest::SignAndSendTransaction(SignAndSendParams {
            transaction: transaction.encode()?,
            options,
        });
        let reply: SignAndSendReply =
            parse_reply("sign_and_send_transaction", self.send_request(request).await?)?;
        let account = Account::from_base58(&reply.public_key)?;
        Ok(SubmittedTransaction {
            signature: reply.signature,
            public_key: account.public_key(),
        })
    }

    /// Sign a mixed batch in one host request. Each reply item is decoded by
    /// its own `versioned` flag and must match the variant it was sent as.
    pub async fn sign_all_transactions(
        &self,
        transactions: Vec<WalletTransaction>,
    ) -> Result<Vec<WalletTransaction>> {
        if transactions.is_empty() {
            return Ok(Vec::new());
        }
        let kinds: Vec<TransactionKind> = transactions.iter().map(WalletTransaction::kind).collect();
        let encoded = transactions
            .iter()
            .map(WalletTransaction::encode)
            .collect::<Result<Vec<_>>>()?;
        log::debug!("✍️  Bridge: sign {} transactions", encoded.len());

        let replies: Vec<BatchSignedReply> = parse_reply(
            "sign_all_transactions",
            self.send_request(HostRequest::SignAllTransactions { transactions: encoded })
                .await?,
        )?;
        if replies.len() != kinds.len() {
            return Err(BridgeError::invalid_response(format!(
                "sign_all_transactions: sent {} transactions, host returned {}",
                kinds.len(),
                replies.len()
            )));
        }

        replies
            .into_iter()
            .zip(kinds)
            .enumerate()
            .map(|(index, (reply, sent))| {
                let kind = if reply.versioned {
                    TransactionKind::Versioned
                } else {
                    TransactionKind::Legacy
                };
                if kind != sent {
                    return Err(BridgeError::invalid_response(format!(
                        "sign_all_transactions: item {} sent as {:?}, returned as {:?}",
                        index, sent, kind
                    )));
                }
                WalletTransaction::decode(
                    kind,
                    &reply.encoded_signed_transaction,
                    reply.encoded_signed_signatures.as_deref(),
                )
            })
            .collect()
    }

    /// Out-of-band push from the host: the user switched accounts.
    pub fn emit_account_changed(&self, public_key: &str) -> Result<Account> {
        let account = Account::from_base58(public_key)?;
        self.set_account(Some(account));
        log::info!("🔄 Bridge: account changed to {}", account);
        self.events.emit(
            &ProviderEventName::AccountChanged,
            &ProviderEvent::AccountChanged(account),
        );
        Ok(account)
    }

    fn set_account(&self, account: Option<Account>) {
        *self.account.lock().unwrap_or_else(|e| e.into_inner()) = account;
    }
}

fn parse_reply<T: DeserializeOwned>(method: &str, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| BridgeError::invalid_response(format!("{}: {}", method, e)))
}
