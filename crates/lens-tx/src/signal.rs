//! Cancellation and deadline signal threaded through one submission flow.

use std::{fmt, future::Future, time::Duration};

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Why a flow stopped early.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Interrupt {
    /// The caller cancelled the token.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Cancellation token plus optional deadline.
///
/// Cloning shares the token; cancelling any clone interrupts every flow using it.
#[derive(Debug, Clone, Default)]
pub struct CancelScope {
    /// Caller-controlled cancellation.
    token: CancellationToken,
    /// Instant after which the scope counts as expired.
    deadline: Option<Instant>,
}

impl CancelScope {
    /// Creates a scope with a fresh token and no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope driven by an existing token.
    #[must_use]
    pub const fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Sets the deadline to `timeout` from now, keeping an earlier existing deadline.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Sets the deadline, keeping an earlier existing deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Returns the underlying token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels the scope and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the interrupt reason if the scope already fired. Cancellation wins over
    /// an expired deadline.
    #[must_use]
    pub fn interrupted(&self) -> Option<Interrupt> {
        if self.token.is_cancelled() {
            return Some(Interrupt::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interrupt::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the scope fires.
    pub async fn fired(&self) -> Interrupt {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => Interrupt::Cancelled,
                    () = sleep_until(deadline) => Interrupt::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                Interrupt::Cancelled
            }
        }
    }

    /// Runs `future` unless the scope fires first.
    ///
    /// # Errors
    ///
    /// Returns the [`Interrupt`] when the scope fired before or while `future` ran; the
    /// future is dropped in that case.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, Interrupt> {
        if let Some(interrupt) = self.interrupted() {
            return Err(interrupt);
        }
        tokio::select! {
            biased;
            interrupt = self.fired() => Err(interrupt),
            output = future => Ok(output),
        }
    }

    /// Sleeps for `duration` unless the scope fires first.
    ///
    /// # Errors
    ///
    /// Returns the [`Interrupt`] when the scope fired.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Interrupt> {
        self.run(tokio::time::sleep(duration)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_pending_future() {
        let scope = CancelScope::new().with_timeout(Duration::from_millis(100));
        let started = Instant::now();
        let result = scope.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(Interrupt::DeadlineExceeded));
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_is_seen_by_clones() {
        let scope = CancelScope::new();
        let clone = scope.clone();
        let waiter = tokio::spawn(async move { clone.sleep(Duration::from_secs(60)).await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        scope.cancel();
        let joined = waiter.await;
        assert!(matches!(joined, Ok(Err(Interrupt::Cancelled))));
    }

    #[tokio::test]
    async fn cancellation_wins_over_expired_deadline() {
        let scope = CancelScope::new().with_deadline(Instant::now());
        assert_eq!(scope.interrupted(), Some(Interrupt::DeadlineExceeded));
        scope.cancel();
        assert_eq!(scope.interrupted(), Some(Interrupt::Cancelled));
        assert_eq!(scope.run(async { 1 }).await, Err(Interrupt::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_deadline_is_kept() {
        let now = Instant::now();
        let scope = CancelScope::new()
            .with_deadline(now + Duration::from_millis(10))
            .with_timeout(Duration::from_secs(5));
        assert_eq!(scope.deadline(), Some(now + Duration::from_millis(10)));
        assert_eq!(scope.run(async { 7 }).await, Ok(7));
    }
}
