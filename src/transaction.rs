// src/transaction.rs
use crate::bridge::protocol::EncodedTransaction;
use crate::error::{BridgeError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use solana_sdk::{
    message::VersionedMessage,
    signature::Signature,
    transaction::{Transaction, VersionedTransaction},
};

/// Wire format tag sent alongside every transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Legacy,
    Versioned,
}

/// A transaction in one of the two Solana wire formats.
///
/// The variant is preserved across every host round trip: a versioned
/// transaction in always gives a versioned transaction out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletTransaction {
    Legacy(Transaction),
    Versioned(VersionedTransaction),
}

impl WalletTransaction {
    pub fn kind(&self) -> TransactionKind {
        match self {
            WalletTransaction::Legacy(_) => TransactionKind::Legacy,
            WalletTransaction::Versioned(_) => TransactionKind::Versioned,
        }
    }

    pub fn signatures(&self) -> &[Signature] {
        match self {
            WalletTransaction::Legacy(tx) => &tx.signatures,
            WalletTransaction::Versioned(tx) => &tx.signatures,
        }
    }

    /// Classify raw wire bytes handed in by a page.
    ///
    /// Bytes carrying a legacy message become `Legacy`; anything with a
    /// version prefix stays `Versioned`.
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self> {
        let tx: VersionedTransaction = deserialize_exact(bytes, "transaction")?;
        Ok(match tx.message {
            VersionedMessage::Legacy(message) => WalletTransaction::Legacy(Transaction {
                signatures: tx.signatures,
                message,
            }),
            VersionedMessage::V0(_) => WalletTransaction::Versioned(tx),
        })
    }

    /// Wire bytes, without requiring every signature to be present
    pub fn to_wire_bytes(&self) -> Result<Vec<u8>> {
        let bytes = match self {
            WalletTransaction::Legacy(tx) => bincode::serialize(tx)?,
            WalletTransaction::Versioned(tx) => bincode::serialize(tx)?,
        };
        Ok(bytes)
    }

    /// Encode for the host. Versioned transactions also carry their current
    /// signatures so the host can keep co-signers' slots.
    pub fn encode(&self) -> Result<EncodedTransaction> {
        let transaction = bs58::encode(self.to_wire_bytes()?).into_string();
        let signatures = match self {
            WalletTransaction::Legacy(_) => None,
            WalletTransaction::Versioned(tx) => {
                Some(tx.signatures.iter().map(|sig| sig.to_string()).collect())
            }
        };
        Ok(EncodedTransaction {
            transaction,
            signatures,
            kind: self.kind(),
        })
    }

    /// Rebuild a signed transaction from the host's base58 reply.
    ///
    /// For versioned transactions `signatures`, when given, replaces the
    /// signatures embedded in the encoded bytes.
    pub fn decode(
        kind: TransactionKind,
        encoded: &str,
        signatures: Option<&[String]>,
    ) -> Result<Self> {
        let bytes = bs58::decode(encoded).into_vec()?;
        match kind {
            TransactionKind::Legacy => {
                let tx: Transaction = deserialize_exact(&bytes, "legacy transaction")?;
                Ok(WalletTransaction::Legacy(tx))
            }
            TransactionKind::Versioned => {
                let mut tx: VersionedTransaction =
                    deserialize_exact(&bytes, "versioned transaction")?;
                if let Some(signatures) = signatures {
                    tx.signatures = signatures
                        .iter()
                        .map(|sig| decode_signature(sig))
                        .collect::<Result<Vec<_>>>()?;
                }
                Ok(WalletTransaction::Versioned(tx))
            }
        }
    }
}

impl From<Transaction> for WalletTransaction {
    fn from(tx: Transaction) -> Self {
        WalletTransaction::Legacy(tx)
    }
}

impl From<VersionedTransaction> for WalletTransaction {
    fn from(tx: VersionedTransaction) -> Self {
        WalletTransaction::Versioned(tx)
    }
}

/// Deserialize a whole buffer; trailing bytes are an error rather than
/// being dropped on the next serialization.
fn deserialize_exact<T>(bytes: &[u8], what: &str) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let value: T = bincode::deserialize(bytes)
        .map_err(|e| BridgeError::encoding(format!("failed to deserialize {}: {}", what, e)))?;
    let consumed = bincode::serialized_size(&value)?;
    if consumed != bytes.len() as u64 {
        return Err(BridgeError::encoding(format!(
            "{} has {} trailing bytes",
            what,
            (bytes.len() as u64).saturating_sub(consumed)
        )));
    }
    Ok(value)
}

/// Decode a base58 ed25519 signature (expect exactly 64 bytes)
pub fn decode_signature(encoded: &str) -> Result<Signature> {
    let bytes = bs58::decode(encoded).into_vec()?;
    if bytes.len() != 64 {
        return Err(BridgeError::encoding(format!(
            "invalid signature length: expected 64, got {}",
            bytes.len()
        )));
    }
    let mut sig_array = [0u8; 64];
    sig_array.copy_from_slice(&bytes);
    Ok(Signature::from(sig_array))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{legacy_transaction, v0_transaction};
    use solana_sdk::pubkey::Pubkey;

    fn payer() -> Pubkey {
        Pubkey::new_from_array([7u8; 32])
    }

    #[test]
    fn test_wire_bytes_keep_variant() {
        let legacy = WalletTransaction::Legacy(legacy_transaction(&payer()));
        let versioned = WalletTransaction::Versioned(v0_transaction(&payer()));

        let legacy_back = WalletTransaction::from_wire_bytes(&legacy.to_wire_bytes().unwrap()).unwrap();
        let versioned_back =
            WalletTransaction::from_wire_bytes(&versioned.to_wire_bytes().unwrap()).unwrap();

        assert_eq!(legacy_back, legacy);
        assert_eq!(versioned_back, versioned);
        assert_eq!(versioned_back.kind(), TransactionKind::Versioned);
    }

    #[test]
    fn test_encode_carries_signatures_for_versioned_only() {
        let legacy = WalletTransaction::Legacy(legacy_transaction(&payer())).encode().unwrap();
        assert_eq!(legacy.kind, TransactionKind::Legacy);
        assert!(legacy.signatures.is_none());

        let versioned = WalletTransaction::Versioned(v0_transaction(&payer())).encode().unwrap();
        assert_eq!(versioned.kind, TransactionKind::Versioned);
        assert_eq!(versioned.signatures.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_decode_replaces_versioned_signatures() {
        let tx = WalletTransaction::Versioned(v0_transaction(&payer()));
        let encoded = tx.encode().unwrap();
        let new_sig = Signature::from([9u8; 64]);

        let decoded = WalletTransaction::decode(
            TransactionKind::Versioned,
            &encoded.transaction,
            Some(&[new_sig.to_string()]),
        )
        .unwrap();
        assert_eq!(decoded.signatures(), &[new_sig]);
    }

    #[test]
    fn test_decode_signature_rejects_wrong_length() {
        let short = bs58::encode([1u8; 10]).into_string();
        assert!(matches!(
            decode_signature(&short),
            Err(BridgeError::Encoding(_))
        ));
    }

    #[test]
    fn test_from_wire_bytes_rejects_garbage() {
        assert!(WalletTransaction::from_wire_bytes(&[0xff, 0x01]).is_err());
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        for tx in [
            WalletTransaction::Legacy(legacy_transaction(&payer())),
            WalletTransaction::Versioned(v0_transaction(&payer())),
        ] {
            let mut bytes = tx.to_wire_bytes().unwrap();
            bytes.extend_from_slice(&[0xde, 0xad]);
            assert!(matches!(
                WalletTransaction::from_wire_bytes(&bytes),
                Err(BridgeError::Encoding(_))
            ));

            let padded = bs58::encode(&bytes).into_string();
            assert!(WalletTransaction::decode(tx.kind(), &padded, None).is_err());
        }
    }
}
