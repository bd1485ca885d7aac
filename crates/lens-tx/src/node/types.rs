//! Node capability trait, response records, and transport errors.

use async_trait::async_trait;
use thiserror::Error;

use crate::hash::TxHash;

/// Low-level errors surfaced by node transports.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum NodeTransportError {
    /// Invalid transport configuration.
    #[error("transport configuration invalid: {message}")]
    Config {
        /// Human-readable description.
        message: String,
    },
    /// Transport operation failed.
    #[error("transport failure: {message}")]
    Failure {
        /// Human-readable description.
        message: String,
    },
    /// Node answered with a JSON-RPC error object.
    #[error("rpc method `{method}` error {code}: {message} ({data})")]
    Rpc {
        /// Called RPC method.
        method: &'static str,
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
        /// Free-text error detail; the node puts its rejection reason here.
        data: String,
    },
}

/// Outcome of a synchronous admission check.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BroadcastResponse {
    /// Result code, 0 on admission.
    pub code: u32,
    /// Namespace for `code`.
    pub codespace: String,
    /// Hex-encoded response data.
    pub data: String,
    /// Admission log text.
    pub log: String,
    /// Hash reported by the node.
    pub hash: String,
}

/// Execution result recorded for a committed transaction.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TxExecResult {
    /// Result code, 0 on success.
    pub code: u32,
    /// Namespace for `code`.
    pub codespace: String,
    /// Hex-encoded response data.
    pub data: String,
    /// Execution log, usually a JSON array of message logs.
    pub log: String,
    /// Additional info text.
    pub info: String,
    /// Gas requested.
    pub gas_wanted: i64,
    /// Gas consumed.
    pub gas_used: i64,
}

/// Committed transaction record returned by a lookup by hash.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FinalizedTx {
    /// Hash of `tx`.
    pub hash: String,
    /// Block height the transaction was committed at.
    pub height: i64,
    /// Position inside the block.
    pub index: u32,
    /// Raw transaction bytes as committed.
    pub tx: Vec<u8>,
    /// Execution result.
    pub result: TxExecResult,
}

/// Node RPC surface consumed by the confirmation flow.
///
/// Implementations must tolerate concurrent calls; the flow adds no locking around them.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Runs the node's admission check on `tx_bytes` and returns its verdict.
    async fn broadcast_sync(&self, tx_bytes: &[u8]) -> Result<BroadcastResponse, NodeTransportError>;

    /// Returns up to `limit` raw transactions currently in the pending pool.
    async fn list_pending(&self, limit: usize) -> Result<Vec<Vec<u8>>, NodeTransportError>;

    /// Looks up a committed transaction. Fails while the transaction is not yet indexed.
    async fn get_finalized(&self, hash: &TxHash) -> Result<FinalizedTx, NodeTransportError>;
}
