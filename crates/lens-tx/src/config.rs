//! Confirmation flow tuning and its environment overrides.

use std::{num::NonZeroU32, time::Duration};

use crate::retry::RetryPolicy;

/// Poll interval override, milliseconds.
pub const ENV_POLL_INTERVAL_MS: &str = "LENS_TX_POLL_INTERVAL_MS";
/// Pending-pool listing limit override.
pub const ENV_PENDING_LIMIT: &str = "LENS_TX_PENDING_LIMIT";
/// First retry delay override, milliseconds.
pub const ENV_RETRY_INITIAL_DELAY_MS: &str = "LENS_TX_RETRY_INITIAL_DELAY_MS";
/// Retry delay cap override, milliseconds.
pub const ENV_RETRY_MAX_DELAY_MS: &str = "LENS_TX_RETRY_MAX_DELAY_MS";
/// Lookup attempt budget override; `0` means unlimited.
pub const ENV_RETRY_MAX_ATTEMPTS: &str = "LENS_TX_RETRY_MAX_ATTEMPTS";

/// Tuning for the pending-pool watch and the confirmation lookup.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ConfirmConfig {
    /// Delay between pending-pool listings.
    pub poll_interval: Duration,
    /// Maximum pending-pool entries requested per listing.
    pub pending_limit: usize,
    /// Retry strategy for the finalized-record lookup.
    pub retry: RetryPolicy,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            pending_limit: 1_000,
            retry: RetryPolicy::default(),
        }
    }
}

impl ConfirmConfig {
    /// Returns defaults overridden by any valid `LENS_TX_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Returns defaults overridden by values from `lookup`; unparsable values are ignored.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read_positive = |name: &str| {
            lookup(name)
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
        };

        let max_attempts = match lookup(ENV_RETRY_MAX_ATTEMPTS)
            .and_then(|value| value.trim().parse::<u32>().ok())
        {
            Some(value) => NonZeroU32::new(value),
            None => defaults.retry.max_attempts,
        };

        Self {
            poll_interval: read_positive(ENV_POLL_INTERVAL_MS)
                .map_or(defaults.poll_interval, Duration::from_millis),
            pending_limit: read_positive(ENV_PENDING_LIMIT)
                .and_then(|value| usize::try_from(value).ok())
                .unwrap_or(defaults.pending_limit),
            retry: RetryPolicy {
                initial_delay: read_positive(ENV_RETRY_INITIAL_DELAY_MS)
                    .map_or(defaults.retry.initial_delay, Duration::from_millis),
                max_delay: read_positive(ENV_RETRY_MAX_DELAY_MS)
                    .map_or(defaults.retry.max_delay, Duration::from_millis),
                max_attempts,
            },
        }
        .normalized()
    }

    /// Returns this config with bounded minimums.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            poll_interval: self.poll_interval.max(Duration::from_millis(1)),
            pending_limit: self.pending_limit.max(1),
            retry: self.retry.normalized(),
        }
    }
}
