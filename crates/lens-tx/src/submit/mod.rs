//! Broadcast, pending-pool watch, and confirmation lookup.

/// Client construction, admission check, and end-to-end orchestration.
mod client;
/// Committed-record lookup with bounded retry.
mod confirm;
/// Pending-pool watch.
mod mempool;
/// Flow stages and errors.
mod types;

pub use client::TxConfirmClient;
pub use types::{ConfirmError, Stage};
