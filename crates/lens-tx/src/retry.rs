//! Bounded retry strategy for lookups that fail transiently.

use std::{num::NonZeroU32, time::Duration};

/// Exponential backoff with a delay cap and an optional attempt budget.
///
/// The delay before retry `n` (0-based) is `initial_delay * 2^n`, capped at `max_delay`.
/// Retries stop when the caller's [`crate::CancelScope`] fires. The default has no attempt
/// budget, so the scope alone bounds the lookup.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Total attempts allowed, including the first; `None` retries until interrupted.
    pub max_attempts: Option<NonZeroU32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(100),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Returns a policy that retries until the caller interrupts it.
    #[must_use]
    pub const fn until_interrupted(self) -> Self {
        Self {
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            max_attempts: None,
        }
    }

    /// Returns a normalized policy with bounded minimums.
    #[must_use]
    pub fn normalized(self) -> Self {
        let initial_delay = self.initial_delay.max(Duration::from_millis(1));
        Self {
            initial_delay,
            max_delay: self.max_delay.max(initial_delay),
            max_attempts: self.max_attempts,
        }
    }

    /// Returns the delay to wait after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1_u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Returns true when another attempt may follow `attempt` failed attempts.
    #[must_use]
    pub fn allows_another(&self, attempt: u32) -> bool {
        self.max_attempts
            .is_none_or(|max_attempts| attempt < max_attempts.get())
    }
}
