//! Structured transaction result and the builder that assembles it from a committed record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    decode::{AnyMessage, TxDecoder},
    hash::TxHash,
    node::{BroadcastResponse, FinalizedTx},
    submit::ConfirmError,
};

/// Key/value attribute of an event.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key.
    #[serde(default)]
    pub key: String,
    /// Attribute value.
    #[serde(default)]
    pub value: String,
}

/// Event emitted while executing one message.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StringEvent {
    /// Event type.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Event attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// Execution log of one message in the transaction.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MessageLog {
    /// Index of the message inside the transaction.
    #[serde(default)]
    pub msg_index: u32,
    /// Free-text log.
    #[serde(default)]
    pub log: String,
    /// Emitted events.
    #[serde(default)]
    pub events: Vec<StringEvent>,
}

/// Parses a JSON message-log array; any other log text yields no entries.
#[must_use]
pub fn parse_message_logs(raw_log: &str) -> Vec<MessageLog> {
    serde_json::from_str(raw_log).unwrap_or_default()
}

/// Result of submitting one transaction.
///
/// JSON field names follow the chain SDK's transaction response.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TxResponse {
    /// Commit height; 0 until the transaction is confirmed.
    #[serde(default)]
    pub height: i64,
    /// Upper-case hex content hash of the submitted bytes.
    #[serde(rename = "txhash")]
    pub hash: String,
    /// Namespace for `code`.
    #[serde(default)]
    pub codespace: String,
    /// Result code, 0 on success.
    #[serde(default)]
    pub code: u32,
    /// Upper-case hex response data.
    #[serde(default)]
    pub data: String,
    /// Raw node log.
    #[serde(default)]
    pub raw_log: String,
    /// Message logs parsed from `raw_log`.
    #[serde(default)]
    pub logs: Vec<MessageLog>,
    /// Additional info text.
    #[serde(default)]
    pub info: String,
    /// Gas requested.
    #[serde(default)]
    pub gas_wanted: i64,
    /// Gas consumed.
    #[serde(default)]
    pub gas_used: i64,
    /// Decoded transaction; present only once confirmed.
    #[serde(rename = "tx", default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<AnyMessage>,
    /// Wall-clock time the confirmed result was assembled.
    ///
    /// This is when the client observed the commit, not the block time.
    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

impl TxResponse {
    /// Creates a classified pre-admission rejection.
    #[must_use]
    pub fn rejected(hash: TxHash, code: u32, codespace: impl Into<String>) -> Self {
        Self {
            hash: hash.to_hex(),
            code,
            codespace: codespace.into(),
            ..Self::default()
        }
    }

    /// Creates a response from an admission check verdict.
    ///
    /// `hash` is the locally computed hash of the submitted bytes.
    #[must_use]
    pub fn from_broadcast(hash: TxHash, response: BroadcastResponse) -> Self {
        Self {
            hash: hash.to_hex(),
            codespace: response.codespace,
            code: response.code,
            data: response.data,
            logs: parse_message_logs(&response.log),
            raw_log: response.log,
            ..Self::default()
        }
    }

    /// Returns true for code 0.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Returns the response when its code is 0.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::Rejected`] carrying the code, codespace, and log otherwise.
    pub fn ensure_success(self) -> Result<Self, ConfirmError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(ConfirmError::Rejected {
            code: self.code,
            codespace: self.codespace,
            raw_log: self.raw_log,
        })
    }

    /// Renders indented JSON for display.
    ///
    /// # Errors
    ///
    /// Returns the serializer error, which only occurs for non-string map keys.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Assembles the final [`TxResponse`] from a committed record.
#[derive(Clone)]
pub struct ResultBuilder {
    /// Chain-specific decoder for committed bytes.
    decoder: Arc<dyn TxDecoder>,
}

impl ResultBuilder {
    /// Creates a builder around a decoding capability.
    #[must_use]
    pub fn new(decoder: Arc<dyn TxDecoder>) -> Self {
        Self { decoder }
    }

    /// Decodes `record.tx` and combines it with the record and the current time.
    ///
    /// The response carries `hash`, the hash of the submitted bytes, even when the node
    /// returned different committed bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::Decode`] when the bytes do not decode, and
    /// [`ConfirmError::MissingAnyExtraction`] when the decoded value has no canonical
    /// container. Neither is retryable.
    pub fn build(&self, hash: &TxHash, record: &FinalizedTx) -> Result<TxResponse, ConfirmError> {
        if TxHash::of(&record.tx) != *hash {
            tracing::warn!(
                hash = %hash,
                height = record.height,
                "committed bytes hash differently from the submitted transaction"
            );
        }
        let decoded = self
            .decoder
            .decode(&record.tx)
            .map_err(|source| ConfirmError::Decode { source })?;
        let envelope = decoded
            .as_any()
            .ok_or_else(|| ConfirmError::MissingAnyExtraction {
                type_name: decoded.type_name(),
            })?;
        let result = &record.result;
        Ok(TxResponse {
            height: record.height,
            hash: hash.to_hex(),
            codespace: result.codespace.clone(),
            code: result.code,
            data: result.data.clone(),
            raw_log: result.log.clone(),
            logs: parse_message_logs(&result.log),
            info: result.info.clone(),
            gas_wanted: result.gas_wanted,
            gas_used: result.gas_used,
            envelope: Some(envelope),
            observed_at: Some(Utc::now()),
        })
    }
}
