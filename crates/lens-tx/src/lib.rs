#![forbid(unsafe_code)]
#![cfg_attr(
    test,
    allow(
        clippy::arithmetic_side_effects,
        clippy::expect_used,
        clippy::indexing_slicing,
        clippy::missing_docs_in_private_items,
        clippy::panic,
        clippy::unwrap_used,
        missing_docs
    )
)]

//! Transaction confirmation SDK: broadcast signed bytes to a Tendermint node, follow them
//! out of the pending pool, and return the committed, decoded result.
//!
//! Start from [`TxConfirmClient::broadcast_tx`] with a [`JsonRpcNode`] and a
//! [`RawTxDecoder`], or plug in your own [`NodeClient`] and [`TxDecoder`].

/// Mapping of free-text admission refusals to result codes.
pub mod classify;
/// Poll and retry tuning.
pub mod config;
/// Transaction decoding capability.
pub mod decode;
/// Transaction content hash.
pub mod hash;
/// Tracing subscriber setup.
pub mod logging;
/// Node RPC capabilities and the JSON-RPC client.
pub mod node;
/// Structured result and result builder.
pub mod response;
/// Bounded retry strategy.
pub mod retry;
/// Cancellation and deadline signal.
pub mod signal;
/// Broadcast and confirmation flow.
pub mod submit;

pub use classify::{RejectionRule, RejectionRules};
pub use config::ConfirmConfig;
pub use decode::{AnyMessage, DecodeError, DecodedTx, RawTxDecoder, TxDecoder};
pub use hash::TxHash;
pub use node::{BroadcastResponse, FinalizedTx, JsonRpcNode, NodeClient, NodeTransportError};
pub use response::{ResultBuilder, TxResponse};
pub use retry::RetryPolicy;
pub use signal::{CancelScope, Interrupt};
pub use submit::{ConfirmError, Stage, TxConfirmClient};
