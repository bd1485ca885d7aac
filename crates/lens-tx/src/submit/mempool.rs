//! Pending-pool watch.

use tokio::time::{MissedTickBehavior, interval};

use super::{ConfirmError, Stage, TxConfirmClient};
use crate::{
    hash::TxHash,
    signal::{CancelScope, Interrupt},
};

impl TxConfirmClient {
    /// Polls the node's pending pool until `hash` is no longer listed.
    ///
    /// The first listing happens one poll interval after the call. A failed listing is
    /// inconclusive and polling continues on the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`ConfirmError::Cancelled`] or [`ConfirmError::DeadlineExceeded`] when
    /// `scope` fires; this is the only way the watch ends without success.
    pub async fn wait_until_gone(
        &self,
        scope: &CancelScope,
        hash: &TxHash,
    ) -> Result<(), ConfirmError> {
        let interrupted =
            |interrupt: Interrupt| ConfirmError::interrupted(Stage::MempoolWatch, interrupt, None);
        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.reset();

        let mut polls = 0_u64;
        loop {
            scope.run(ticker.tick()).await.map_err(interrupted)?;
            polls = polls.saturating_add(1);

            let listing = scope
                .run(self.node.list_pending(self.config.pending_limit))
                .await
                .map_err(interrupted)?;
            match listing {
                Ok(pending) => {
                    if !pending.iter().any(|tx| TxHash::of(tx) == *hash) {
                        tracing::debug!(hash = %hash, polls, "transaction left pending pool");
                        return Ok(());
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        hash = %hash,
                        polls,
                        %error,
                        "pending pool listing failed; polling again"
                    );
                }
            }
        }
    }
}
