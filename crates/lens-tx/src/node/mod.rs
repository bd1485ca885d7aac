//! Node RPC capabilities consumed by the confirmation flow.

/// Tendermint JSON-RPC client.
mod rpc;
/// Capability trait, records, and transport errors.
mod types;

pub use rpc::JsonRpcNode;
pub use types::{BroadcastResponse, FinalizedTx, NodeClient, NodeTransportError, TxExecResult};
