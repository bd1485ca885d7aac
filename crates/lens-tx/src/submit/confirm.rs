//! Committed-record lookup with bounded retry.

use super::{ConfirmError, Stage, TxConfirmClient};
use crate::{hash::TxHash, node::FinalizedTx, signal::CancelScope};

impl TxConfirmClient {
    /// Fetches the committed record for `hash`, retrying failed lookups.
    ///
    /// Leaving the pending pool does not make the record queryable right away, so lookup
    /// failures are treated as transient. Retries follow the configured
    /// [`crate::RetryPolicy`] and stop as soon as `scope` fires.
    ///
    /// # Errors
    ///
    /// Returns an interrupt error carrying the last lookup failure when `scope` fires, and
    /// [`ConfirmError::Lookup`] when the attempt budget runs out.
    pub async fn fetch_confirmed(
        &self,
        scope: &CancelScope,
        hash: &TxHash,
    ) -> Result<FinalizedTx, ConfirmError> {
        let policy = self.config.retry;
        let mut attempt = 0_u32;
        let mut last_error = None;

        loop {
            attempt = attempt.saturating_add(1);
            let error = match scope.run(self.node.get_finalized(hash)).await {
                Ok(Ok(record)) => {
                    tracing::debug!(
                        hash = %hash,
                        attempt,
                        height = record.height,
                        "found committed record"
                    );
                    return Ok(record);
                }
                Ok(Err(error)) => error,
                Err(interrupt) => {
                    return Err(ConfirmError::interrupted(
                        Stage::ConfirmationLookup,
                        interrupt,
                        last_error,
                    ));
                }
            };

            if !policy.allows_another(attempt) {
                return Err(ConfirmError::Lookup {
                    hash: *hash,
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = policy.delay_after(attempt);
            tracing::debug!(
                hash = %hash,
                attempt,
                delay = ?delay,
                %error,
                "committed record not available yet"
            );
            if let Err(interrupt) = scope.sleep(delay).await {
                return Err(ConfirmError::interrupted(
                    Stage::ConfirmationLookup,
                    interrupt,
                    Some(error),
                ));
            }
            last_error = Some(error);
        }
    }
}
