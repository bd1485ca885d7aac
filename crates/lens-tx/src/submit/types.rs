//! Confirmation flow stages and errors.

use std::fmt;

use thiserror::Error;

use crate::{decode::DecodeError, hash::TxHash, node::NodeTransportError, signal::Interrupt};

/// Flow stage, used to report where an interrupt landed.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Stage {
    /// Synchronous admission check.
    Broadcast,
    /// Waiting for the transaction to leave the pending pool.
    MempoolWatch,
    /// Fetching the committed record.
    ConfirmationLookup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast => f.write_str("broadcast"),
            Self::MempoolWatch => f.write_str("pending-pool watch"),
            Self::ConfirmationLookup => f.write_str("confirmation lookup"),
        }
    }
}

/// Errors surfaced by the confirmation flow.
///
/// Classified refusals and failed admission checks are not errors; they come back as a
/// [`crate::TxResponse`] with a nonzero code.
#[derive(Debug, Error)]
pub enum ConfirmError {
    /// Node refused the broadcast for a reason no rejection rule recognizes.
    #[error(transparent)]
    Transport {
        /// Unmodified transport error.
        source: NodeTransportError,
    },
    /// Caller cancelled the flow.
    #[error("{stage} cancelled")]
    Cancelled {
        /// Stage that was running.
        stage: Stage,
        /// Last transient failure seen before cancellation.
        #[source]
        last_error: Option<NodeTransportError>,
    },
    /// Caller deadline passed.
    #[error("{stage} deadline exceeded")]
    DeadlineExceeded {
        /// Stage that was running.
        stage: Stage,
        /// Last transient failure seen before the deadline.
        #[source]
        last_error: Option<NodeTransportError>,
    },
    /// Lookup attempt budget ran out before the record became available.
    #[error("transaction {hash} not found after {attempts} lookup attempts: {source}")]
    Lookup {
        /// Looked-up hash.
        hash: TxHash,
        /// Attempts made.
        attempts: u32,
        /// Error of the final attempt.
        source: NodeTransportError,
    },
    /// Committed bytes did not decode.
    #[error("failed to decode committed transaction: {source}")]
    Decode {
        /// Decoder error.
        source: DecodeError,
    },
    /// Decoded value cannot produce a canonical message container.
    #[error("decoded transaction type `{type_name}` has no canonical message container")]
    MissingAnyExtraction {
        /// Concrete decoded type.
        type_name: &'static str,
    },
    /// Transaction finished with a nonzero code.
    #[error("transaction rejected: code({code}) codespace({codespace}) log({raw_log})")]
    Rejected {
        /// Result code.
        code: u32,
        /// Code namespace.
        codespace: String,
        /// Node log.
        raw_log: String,
    },
}

impl ConfirmError {
    /// Maps an interrupt at `stage` into the matching variant.
    #[must_use]
    pub fn interrupted(
        stage: Stage,
        interrupt: Interrupt,
        last_error: Option<NodeTransportError>,
    ) -> Self {
        match interrupt {
            Interrupt::Cancelled => Self::Cancelled { stage, last_error },
            Interrupt::DeadlineExceeded => Self::DeadlineExceeded { stage, last_error },
        }
    }

    /// Returns true for cancellation and deadline errors.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::DeadlineExceeded { .. })
    }
}
