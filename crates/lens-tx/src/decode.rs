//! Transaction decoding capability injected into the result builder.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Type URL of the chain SDK's transaction message.
pub const COSMOS_TX_TYPE_URL: &str = "/cosmos.tx.v1beta1.Tx";

/// Canonical, wire-format-agnostic message container (`type_url` + encoded `value`).
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AnyMessage {
    /// Fully qualified message type.
    pub type_url: String,
    /// Encoded message body; base64 in JSON.
    #[serde(serialize_with = "ser_base64", deserialize_with = "de_base64")]
    pub value: Vec<u8>,
}

impl AnyMessage {
    /// Creates a container.
    #[must_use]
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }
}

/// Serializes bytes as standard base64.
fn ser_base64<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64_STANDARD.encode(value))
}

/// Deserializes standard base64 into bytes.
fn de_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    BASE64_STANDARD
        .decode(encoded)
        .map_err(serde::de::Error::custom)
}

/// Errors raised while decoding committed transaction bytes.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum DecodeError {
    /// No bytes to decode.
    #[error("transaction bytes are empty")]
    Empty,
    /// Bytes do not form a valid transaction.
    #[error("malformed transaction: {message}")]
    Malformed {
        /// Human-readable description.
        message: String,
    },
}

/// Decoded transaction value.
pub trait DecodedTx: fmt::Debug + Send {
    /// Extracts the canonical message container.
    ///
    /// Returns `None` for values that cannot be represented that way; the result builder
    /// treats this as a configuration error, not a retryable one.
    fn as_any(&self) -> Option<AnyMessage> {
        None
    }

    /// Returns the concrete type name, for diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Chain-specific transaction decoder.
pub trait TxDecoder: Send + Sync {
    /// Decodes raw committed transaction bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the bytes are not a valid transaction.
    fn decode(&self, tx_bytes: &[u8]) -> Result<Box<dyn DecodedTx>, DecodeError>;
}

/// Decoder that keeps the encoded transaction as-is under a fixed type URL.
///
/// Suitable when the committed bytes are already the protobuf encoding of the type named by
/// `type_url`, which holds for chain SDK transactions.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RawTxDecoder {
    /// Type URL attached to decoded values.
    type_url: String,
}

impl Default for RawTxDecoder {
    fn default() -> Self {
        Self::new(COSMOS_TX_TYPE_URL)
    }
}

impl RawTxDecoder {
    /// Creates a decoder tagging values with `type_url`.
    #[must_use]
    pub fn new(type_url: impl Into<String>) -> Self {
        Self {
            type_url: type_url.into(),
        }
    }
}

/// Transaction decoded by [`RawTxDecoder`].
#[derive(Debug, Clone, Eq, PartialEq)]
struct RawTx {
    /// Type URL of `bytes`.
    type_url: String,
    /// Encoded transaction.
    bytes: Vec<u8>,
}

impl DecodedTx for RawTx {
    fn as_any(&self) -> Option<AnyMessage> {
        Some(AnyMessage::new(self.type_url.clone(), self.bytes.clone()))
    }
}

impl TxDecoder for RawTxDecoder {
    fn decode(&self, tx_bytes: &[u8]) -> Result<Box<dyn DecodedTx>, DecodeError> {
        if tx_bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        Ok(Box::new(RawTx {
            type_url: self.type_url.clone(),
            bytes: tx_bytes.to_vec(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_decoder_wraps_bytes_under_type_url() {
        let decoded = RawTxDecoder::default().decode(b"\x0a\x02hi");
        assert!(decoded.is_ok());
        if let Ok(decoded) = decoded {
            assert_eq!(
                decoded.as_any(),
                Some(AnyMessage::new(COSMOS_TX_TYPE_URL, b"\x0a\x02hi".to_vec()))
            );
        }
    }

    #[test]
    fn raw_decoder_rejects_empty_bytes() {
        assert!(matches!(
            RawTxDecoder::default().decode(&[]),
            Err(DecodeError::Empty)
        ));
    }

    #[test]
    fn any_message_json_uses_base64_value() {
        let message = AnyMessage::new("/test.Msg", vec![1, 2, 3]);
        let json = serde_json::to_value(&message);
        assert!(json.is_ok());
        if let Ok(json) = json {
            assert_eq!(
                json,
                serde_json::json!({ "type_url": "/test.Msg", "value": "AQID" })
            );
            let back: Result<AnyMessage, _> = serde_json::from_value(json);
            assert_eq!(back.ok(), Some(message));
        }
    }
}
