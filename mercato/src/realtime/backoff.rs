use std::time::Duration;

use mercato_core::BackoffConfig;
use rand::Rng;

/// `base_ms` plus up to `jitter_percent` percent of random extra delay.
#[must_use]
pub fn jitter_wait(base_ms: u64, jitter_percent: u32) -> u64 {
    let jitter_range = if jitter_percent == 0 {
        1
    } else {
        std::cmp::max(1, (base_ms.saturating_mul(u64::from(jitter_percent))) / 100)
    };
    let mut rng = rand::rng();
    base_ms + rng.random_range(0..jitter_range)
}

/// Reconnect schedule for one connection.
#[derive(Debug, Clone)]
pub struct Backoff {
    cfg: BackoffConfig,
    next_ms: u64,
    failures: u32,
}

impl Backoff {
    /// Fresh schedule starting at the minimum delay.
    #[must_use]
    pub const fn new(cfg: BackoffConfig) -> Self {
        Self {
            next_ms: cfg.min_backoff_ms,
            cfg,
            failures: 0,
        }
    }

    /// A session reached the ready state; start over from the minimum delay.
    pub const fn reset(&mut self) {
        self.next_ms = self.cfg.min_backoff_ms;
        self.failures = 0;
    }

    /// Record a failed attempt and return the delay before the next one, or
    /// `None` once `max_attempts` consecutive failures have been reached.
    pub fn fail(&mut self) -> Option<Duration> {
        self.failures = self.failures.saturating_add(1);
        if self.cfg.max_attempts.is_some_and(|max| self.failures >= max) {
            return None;
        }
        let base = self.next_ms;
        self.next_ms = std::cmp::min(
            self.cfg.max_backoff_ms.max(self.cfg.min_backoff_ms),
            base.saturating_mul(u64::from(self.cfg.factor.max(1))),
        );
        Some(Duration::from_millis(jitter_wait(
            base,
            u32::from(self.cfg.jitter_percent.min(100)),
        )))
    }

    /// Delay before reconnecting after a session that had been ready.
    #[must_use]
    pub fn after_session(&mut self) -> Duration {
        self.reset();
        Duration::from_millis(jitter_wait(
            self.cfg.min_backoff_ms,
            u32::from(self.cfg.jitter_percent.min(100)),
        ))
    }

    /// Consecutive failures so far.
    #[must_use]
    pub const fn failures(&self) -> u32 {
        self.failures
    }
}
