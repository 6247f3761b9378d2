//! Test fixtures: transactions, a channel-backed client, and a native host
//! stand-in that signs with a real ed25519 key.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde_json::{json, Value};
use solana_sdk::{
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    message::{v0, Message, VersionedMessage},
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, VersionedTransaction},
};
use tokio::sync::mpsc;

use crate::bridge::protocol::HostBytes;
use crate::bridge::{BridgeClient, ChannelTransport};
use crate::config::BridgeConfig;
use crate::transaction::{TransactionKind, WalletTransaction};

fn memo_instruction(payer: &Pubkey) -> Instruction {
    Instruction::new_with_bytes(
        Pubkey::new_from_array([42u8; 32]),
        b"unruggable",
        vec![AccountMeta::new(*payer, true)],
    )
}

pub fn legacy_transaction(payer: &Pubkey) -> Transaction {
    let message = Message::new(&[memo_instruction(payer)], Some(payer));
    Transaction::new_unsigned(message)
}

pub fn v0_transaction(payer: &Pubkey) -> VersionedTransaction {
    let message = v0::Message::try_compile(payer, &[memo_instruction(payer)], &[], Hash::default())
        .expect("compile v0 message");
    VersionedTransaction {
        signatures: vec![Signature::default(); message.header.num_required_signatures as usize],
        message: VersionedMessage::V0(message),
    }
}

pub fn test_client() -> (Arc<BridgeClient>, mpsc::UnboundedReceiver<String>) {
    let (transport, outbound) = ChannelTransport::new();
    let config = BridgeConfig::default().with_request_timeout(Some(Duration::from_secs(5)));
    (Arc::new(BridgeClient::new(Arc::new(transport), config)), outbound)
}

/// An outbound message as the host sees it
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub request_id: String,
    pub method: String,
    pub params: Value,
}

impl SeenRequest {
    pub fn parse(raw: &str) -> Self {
        let value: Value = serde_json::from_str(raw).expect("outbound message is JSON");
        Self {
            request_id: value["requestId"].as_str().expect("requestId").to_string(),
            method: value["data"]["method"].as_str().expect("method").to_string(),
            params: value["data"]["params"].clone(),
        }
    }
}

pub async fn next_request(outbound: &mut mpsc::UnboundedReceiver<String>) -> SeenRequest {
    let raw = tokio::time::timeout(Duration::from_secs(5), outbound.recv())
        .await
        .expect("client sent nothing")
        .expect("transport closed");
    SeenRequest::parse(&raw)
}

pub fn reply(client: &BridgeClient, request_id: &str, result: Value) -> bool {
    client.dispatch(&json!({ "requestId": request_id, "result": result }).to_string())
}

pub fn reply_error(client: &BridgeClient, request_id: &str, error: Value) -> bool {
    client.dispatch(&json!({ "requestId": request_id, "error": error }).to_string())
}

pub type HostLog = Arc<Mutex<Vec<String>>>;

/// Answers every request the way the native wallet does, signing with its
/// own key.
#[derive(Clone)]
pub struct MockHost {
    signing_key: SigningKey,
}

impl MockHost {
    pub fn new(seed: u8) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&[seed; 32]),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::new_from_array(self.signing_key.verifying_key().to_bytes())
    }

    pub fn address(&self) -> String {
        self.pubkey().to_string()
    }

    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(bytes) = <[u8; 64]>::try_from(signature) else {
            return false;
        };
        let verifying_key: VerifyingKey = self.signing_key.verifying_key();
        verifying_key
            .verify(message, &ed25519_dalek::Signature::from_bytes(&bytes))
            .is_ok()
    }

    fn sign(&self, message: &[u8]) -> Signature {
        Signature::from(self.signing_key.sign(message).to_bytes())
    }

    fn sign_slot(&self, signatures: &mut Vec<Signature>, keys: &[Pubkey], required: usize, message: &[u8]) -> Signature {
        let signature = self.sign(message);
        if signatures.len() != required {
            *signatures = vec![Signature::default(); required];
        }
        let index = keys
            .iter()
            .take(required)
            .position(|key| *key == self.pubkey())
            .expect("host key is a required signer");
        signatures[index] = signature;
        signature
    }

    /// Sign an encoded transaction; returns the signed transaction
    pub fn sign_transaction(&self, kind: TransactionKind, encoded: &str) -> (WalletTransaction, Signature) {
        match WalletTransaction::decode(kind, encoded, None).expect("decodable transaction") {
            WalletTransaction::Legacy(mut tx) => {
                let message = tx.message.serialize();
                let required = tx.message.header.num_required_signatures as usize;
                let keys = tx.message.account_keys.clone();
                let sig = self.sign_slot(&mut tx.signatures, &keys, required, &message);
                (WalletTransaction::Legacy(tx), sig)
            }
            WalletTransaction::Versioned(mut tx) => {
                let message = tx.message.serialize();
                let required = tx.message.header().num_required_signatures as usize;
                let keys = tx.message.static_account_keys().to_vec();
                let sig = self.sign_slot(&mut tx.signatures, &keys, required, &message);
                (WalletTransaction::Versioned(tx), sig)
            }
        }
    }

    fn signed_reply(&self, item: &Value) -> (TransactionKind, String, Vec<String>, Signature) {
        let kind: TransactionKind = serde_json::from_value(item["type"].clone()).expect("type tag");
        let encoded = item["transaction"].as_str().expect("transaction");
        let (signed, sig) = self.sign_transaction(kind, encoded);
        let bytes = signed.to_wire_bytes().expect("serialize signed transaction");
        let signatures = signed.signatures().iter().map(|s| s.to_string()).collect();
        (kind, bs58::encode(bytes).into_string(), signatures, sig)
    }

    pub fn answer(&self, request: &SeenRequest) -> Value {
        match request.method.as_str() {
            "connect" => json!({ "publicKey": self.address() }),
            "sign_message" => {
                let message: HostBytes =
                    serde_json::from_value(request.params["message"].clone()).expect("message bytes");
                let signature = self.sign(&message.0);
                let signature: &[u8] = signature.as_ref();
                // Answer the way a Uint8Array crosses JSON.stringify
                let indexed: serde_json::Map<String, Value> = signature
                    .iter()
                    .enumerate()
                    .map(|(i, b)| (i.to_string(), json!(b)))
                    .collect();
                json!({ "signature": indexed, "publicKey": self.address() })
            }
            "sign_transaction" => {
                let (kind, encoded, signatures, _) = self.signed_reply(&request.params);
                match kind {
                    TransactionKind::Legacy => json!(encoded),
                    TransactionKind::Versioned => json!({
                        "encodedSignedTransaction": encoded,
                        "encodedSignedSignatures": signatures,
                    }),
                }
            }
            "sign_and_send_transaction" => {
                let (_, _, _, sig) = self.signed_reply(&request.params);
                json!({ "signature": sig.to_string(), "publicKey": self.address() })
            }
            "sign_all_transactions" => {
                let items = request.params["transactions"].as_array().expect("transactions");
                let signed: Vec<Value> = items
                    .iter()
                    .map(|item| {
                        let (kind, encoded, signatures, _) = self.signed_reply(item);
                        json!({
                            "versioned": kind == TransactionKind::Versioned,
                            "encodedSignedTransaction": encoded,
                            "encodedSignedSignatures": signatures,
                        })
                    })
                    .collect();
                json!(signed)
            }
            other => panic!("unexpected host method {}", other),
        }
    }

    /// Serve `outbound` until it closes. The log records each method in
    /// arrival order, before the reply is dispatched.
    pub fn spawn(
        self,
        client: Arc<BridgeClient>,
        mut outbound: mpsc::UnboundedReceiver<String>,
    ) -> HostLog {
        let log: HostLog = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&log);
        tokio::spawn(async move {
            while let Some(raw) = outbound.recv().await {
                let request = SeenRequest::parse(&raw);
                seen.lock().unwrap().push(request.method.clone());
                let result = self.answer(&request);
                reply(&client, &request.request_id, result);
            }
        });
        log
    }
}
