//! Confirmation client and broadcast orchestration.

use std::sync::Arc;

use super::{ConfirmError, Stage};
use crate::{
    classify::RejectionRules,
    config::ConfirmConfig,
    decode::TxDecoder,
    hash::TxHash,
    node::{FinalizedTx, NodeClient},
    response::{ResultBuilder, TxResponse},
    retry::RetryPolicy,
    signal::CancelScope,
};

/// Client that broadcasts signed transactions and follows them until committed.
///
/// One client may drive many submissions concurrently; they share only the node transport
/// and the read-only rejection rules.
#[derive(Clone)]
pub struct TxConfirmClient {
    /// Node RPC capabilities.
    pub(super) node: Arc<dyn NodeClient>,
    /// Classifier for pre-admission refusals.
    rules: Arc<RejectionRules>,
    /// Final result assembly.
    builder: ResultBuilder,
    /// Poll and retry tuning.
    pub(super) config: ConfirmConfig,
}

impl TxConfirmClient {
    /// Creates a client with default rules and tuning.
    #[must_use]
    pub fn new(node: Arc<dyn NodeClient>, decoder: Arc<dyn TxDecoder>) -> Self {
        Self {
            node,
            rules: Arc::new(RejectionRules::default()),
            builder: ResultBuilder::new(decoder),
            config: ConfirmConfig::default(),
        }
    }

    /// Replaces the rejection rule table.
    #[must_use]
    pub fn with_rejection_rules(mut self, rules: RejectionRules) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    /// Sets poll and retry tuning.
    #[must_use]
    pub fn with_config(mut self, config: ConfirmConfig) -> Self {
        self.config = config.normalized();
        self
    }

    /// Sets the lookup retry strategy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy.normalized();
        self
    }

    /// Returns active tuning.
    #[must_use]
    pub const fn config(&self) -> &ConfirmConfig {
        &self.config
    }

    /// Returns the active rejection rules.
    #[must_use]
    pub fn rejection_rules(&self) -> &RejectionRules {
        &self.rules
    }

    /// Broadcasts `tx_bytes` and waits until the node has committed them.
    ///
    /// A classified refusal or a failed admission check returns early with a nonzero-code
    /// response. Otherwise the flow waits for the transaction to leave the pending pool,
    /// fetches its committed record, and decodes it. The pending-pool watch cannot tell an
    /// included transaction from an evicted one; for an evicted one the lookup keeps
    /// failing until `scope` fires or an opt-in attempt budget runs out.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError`] on unclassified transport failures, interrupts, exhausted
    /// lookups, and decode failures.
    pub async fn broadcast_tx(
        &self,
        scope: &CancelScope,
        tx_bytes: &[u8],
    ) -> Result<TxResponse, ConfirmError> {
        let hash = TxHash::of(tx_bytes);
        let admitted = self.submit_hashed(scope, tx_bytes, hash).await?;
        if !admitted.is_success() {
            return Ok(admitted);
        }

        self.wait_until_gone(scope, &hash).await?;
        let record = self.fetch_confirmed(scope, &hash).await?;
        let result = self.build_result(&hash, &record)?;
        tracing::info!(
            hash = %hash,
            height = result.height,
            code = result.code,
            "transaction committed"
        );
        Ok(result)
    }

    /// Runs the node's synchronous admission check.
    ///
    /// Transport refusals matching a rejection rule come back as a nonzero-code response.
    /// A response with code 0 means the transaction is now in the pending pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::Transport`] for unrecognized transport failures and an
    /// interrupt error when `scope` fires first.
    pub async fn submit_sync(
        &self,
        scope: &CancelScope,
        tx_bytes: &[u8],
    ) -> Result<TxResponse, ConfirmError> {
        self.submit_hashed(scope, tx_bytes, TxHash::of(tx_bytes)).await
    }

    /// Admission check with the hash already computed.
    async fn submit_hashed(
        &self,
        scope: &CancelScope,
        tx_bytes: &[u8],
        hash: TxHash,
    ) -> Result<TxResponse, ConfirmError> {
        let outcome = scope
            .run(self.node.broadcast_sync(tx_bytes))
            .await
            .map_err(|interrupt| ConfirmError::interrupted(Stage::Broadcast, interrupt, None))?;

        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                let Some(rejected) = self.rules.classify(&error, tx_bytes) else {
                    return Err(ConfirmError::Transport { source: error });
                };
                tracing::info!(
                    hash = %hash,
                    code = rejected.code,
                    codespace = %rejected.codespace,
                    %error,
                    "node refused transaction before admission"
                );
                return Ok(rejected);
            }
        };

        if !response.hash.is_empty() && !hash.matches_hex(&response.hash) {
            tracing::warn!(
                hash = %hash,
                node_hash = %response.hash,
                "node reported a different transaction hash; keeping local hash"
            );
        }
        let result = TxResponse::from_broadcast(hash, response);
        if result.is_success() {
            tracing::debug!(hash = %hash, "transaction admitted to pending pool");
        } else {
            tracing::info!(
                hash = %hash,
                code = result.code,
                codespace = %result.codespace,
                "admission check failed"
            );
        }
        Ok(result)
    }

    /// Decodes a committed record into the final response for submitted `hash`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::Decode`] or [`ConfirmError::MissingAnyExtraction`].
    pub fn build_result(
        &self,
        hash: &TxHash,
        record: &FinalizedTx,
    ) -> Result<TxResponse, ConfirmError> {
        self.builder.build(hash, record)
    }
}
