use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::transaction::TransactionKind;

/// Message posted from the page to the native host
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub request_id: String,
    pub data: HostRequest,
}

/// Requests understood by the native host
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum HostRequest {
    /// Ask the host to expose its public key to this page
    Connect {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        config: Option<ConnectConfig>,
    },

    /// Sign arbitrary bytes
    SignMessage {
        message: MessageBytes,
        t: MessageEncoding,
    },

    /// Sign a transaction and hand it back
    SignTransaction(EncodedTransaction),

    /// Sign a transaction and let the host submit it
    SignAndSendTransaction(SignAndSendParams),

    /// Sign a batch of (possibly mixed) transactions in one approval
    SignAllTransactions {
        transactions: Vec<EncodedTransaction>,
    },
}

impl HostRequest {
    pub fn method(&self) -> &'static str {
        match self {
            HostRequest::Connect { .. } => "connect",
            HostRequest::SignMessage { .. } => "sign_message",
            HostRequest::SignTransaction(_) => "sign_transaction",
            HostRequest::SignAndSendTransaction(_) => "sign_and_send_transaction",
            HostRequest::SignAllTransactions { .. } => "sign_all_transactions",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConnectConfig {
    pub only_if_trusted: bool,
}

impl ConnectConfig {
    pub fn only_if_trusted() -> Self {
        Self { only_if_trusted: true }
    }
}

/// How the host should display a message in its approval sheet
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageEncoding {
    #[default]
    Utf8,
    Hex,
}

/// Transaction serialized for the host
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EncodedTransaction {
    /// Base58 encoded wire bytes
    pub transaction: String,
    /// Base58 encoded signatures, versioned transactions only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SignAndSendParams {
    #[serde(flatten)]
    pub transaction: EncodedTransaction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<SendOptions>,
}

/// Submission options, forwarded to the host untouched
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preflight_commitment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_context_slot: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_preflight: Option<bool>,
}

/// Message sent from the native host back into the page
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl InboundMessage {
    /// Human readable text for an `error` payload, if present
    pub fn error_message(&self) -> Option<String> {
        let error = self.error.as_ref()?;
        Some(match error {
            Value::Null => return None,
            Value::String(message) => message.clone(),
            Value::Object(map) => match map.get("message").and_then(Value::as_str) {
                Some(message) => message.to_string(),
                None => error.to_string(),
            },
            other => other.to_string(),
        })
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectReply {
    pub public_key: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignMessageReply {
    pub signature: HostBytes,
    pub public_key: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignAndSendReply {
    /// Base58 encoded on-chain transaction signature
    pub signature: String,
    pub public_key: String,
}

/// Reply to `sign_transaction`: a bare base58 string for legacy
/// transactions, an object for versioned ones.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum SignedTransactionReply {
    Encoded(String),
    Versioned(VersionedSignedReply),
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionedSignedReply {
    pub encoded_signed_transaction: String,
    #[serde(default)]
    pub encoded_signed_signatures: Option<Vec<String>>,
}

/// One item of the `sign_all_transactions` reply
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSignedReply {
    #[serde(default)]
    pub versioned: bool,
    pub encoded_signed_transaction: String,
    #[serde(default)]
    pub encoded_signed_signatures: Option<Vec<String>>,
}

/// Raw bytes on the JSON wire.
///
/// Serializes as an index-keyed object (`{"0": 104, "1": 105}`), which is how
/// a `Uint8Array` crosses `JSON.stringify` and what the host expects. On the
/// way back it also accepts a plain number array or a base58 string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostBytes(pub Vec<u8>);

impl HostBytes {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<&[u8]> for HostBytes {
    fn from(bytes: &[u8]) -> Self {
        HostBytes(bytes.to_vec())
    }
}

pub type MessageBytes = HostBytes;

impl Serialize for HostBytes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, byte) in self.0.iter().enumerate() {
            map.serialize_entry(&i.to_string(), byte)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for HostBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        bytes_from_value(&value).map(HostBytes).map_err(D::Error::custom)
    }
}

fn byte_from_value(value: &Value) -> Result<u8, String> {
    value
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| format!("expected a byte, found {}", value))
}

fn bytes_from_value(value: &Value) -> Result<Vec<u8>, String> {
    match value {
        Value::Array(items) => items.iter().map(byte_from_value).collect(),
        Value::Object(map) => {
            let mut indexed = map
                .iter()
                .map(|(key, v)| {
                    let index: usize = key
                        .parse()
                        .map_err(|_| format!("expected a numeric index, found {:?}", key))?;
                    Ok((index, byte_from_value(v)?))
                })
                .collect::<Result<Vec<_>, String>>()?;
            indexed.sort_by_key(|(index, _)| *index);
            if indexed.iter().enumerate().any(|(i, (index, _))| i != *index) {
                return Err("byte object has gaps in its indices".to_string());
            }
            Ok(indexed.into_iter().map(|(_, byte)| byte).collect())
        }
        Value::String(encoded) => bs58::decode(encoded)
            .into_vec()
            .map_err(|e| format!("invalid base58 bytes: {}", e)),
        other => Err(format!("expected bytes, found {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outbound_envelope_shape() {
        let message = OutboundMessage {
            request_id: "abc123".to_string(),
            data: HostRequest::Connect {
                config: Some(ConnectConfig::only_if_trusted()),
            },
        };
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "requestId": "abc123",
                "data": { "method": "connect", "params": { "config": { "onlyIfTrusted": true } } }
            })
        );
    }

    #[test]
    fn test_connect_without_config_sends_empty_params() {
        let value = serde_json::to_value(HostRequest::Connect { config: None }).unwrap();
        assert_eq!(value, json!({ "method": "connect", "params": {} }));
    }

    #[test]
    fn test_sign_and_send_flattens_transaction() {
        let request = HostRequest::SignAndSendTransaction(SignAndSendParams {
            transaction: EncodedTransaction {
                transaction: "3xyz".to_string(),
                signatures: None,
                kind: TransactionKind::Legacy,
            },
            options: Some(SendOptions {
                max_retries: Some(3),
                ..Default::default()
            }),
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["method"], "sign_and_send_transaction");
        assert_eq!(value["params"]["transaction"], "3xyz");
        assert_eq!(value["params"]["type"], "legacy");
        assert_eq!(value["params"]["options"], json!({ "maxRetries": 3 }));
        assert!(value["params"].get("signatures").is_none());
    }

    #[test]
    fn test_message_bytes_cross_as_index_object() {
        let request = HostRequest::SignMessage {
            message: HostBytes(b"hi".to_vec()),
            t: MessageEncoding::Utf8,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["params"],
            json!({ "message": { "0": 104, "1": 105 }, "t": "utf8" })
        );
    }

    #[test]
    fn test_host_bytes_accepts_every_shape() {
        let expected = HostBytes(vec![1, 2, 3]);
        let from_array: HostBytes = serde_json::from_value(json!([1, 2, 3])).unwrap();
        let from_object: HostBytes =
            serde_json::from_value(json!({ "2": 3, "0": 1, "1": 2 })).unwrap();
        let from_base58: HostBytes = serde_json::from_value(json!("Ldp")).unwrap();
        assert_eq!(from_array, expected);
        assert_eq!(from_object, expected);
        assert_eq!(from_base58, expected);

        assert!(serde_json::from_value::<HostBytes>(json!([256])).is_err());
        assert!(serde_json::from_value::<HostBytes>(json!({ "0": 1, "2": 3 })).is_err());
    }

    #[test]
    fn test_inbound_error_message() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"requestId":"a","error":{"message":"User rejected"}}"#)
                .unwrap();
        assert_eq!(msg.error_message().as_deref(), Some("User rejected"));

        let msg: InboundMessage =
            serde_json::from_str(r#"{"requestId":"a","result":{"publicKey":"x"}}"#).unwrap();
        assert_eq!(msg.error_message(), None);
    }

    #[test]
    fn test_signed_transaction_reply_shapes() {
        let legacy: SignedTransactionReply = serde_json::from_value(json!("4vJ9")).unwrap();
        assert_eq!(legacy, SignedTransactionReply::Encoded("4vJ9".to_string()));

        let versioned: SignedTransactionReply = serde_json::from_value(json!({
            "encodedSignedTransaction": "4vJ9",
            "encodedSignedSignatures": ["5a"]
        }))
        .unwrap();
        assert!(matches!(versioned, SignedTransactionReply::Versioned(_)));
    }
}
