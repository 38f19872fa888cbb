//! Backoff Schedule
//!
//! Delay policy applied between failed probes. The attempt budget is fixed
//! when the schedule is built and is never adjusted by the resolver.

use std::time::Duration;

/// How the wait grows with the attempt index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayStrategy {
    /// Same delay after every failed probe.
    Fixed,
    /// `base * n` after the n-th failed probe.
    Linear,
    /// `base * (((n - 1) % cycle) + 1)`: grows for `cycle` attempts, then
    /// wraps back to `base`.
    Cyclic { cycle: u32 },
}

/// Retry budget and delay policy for one resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    /// Total probes, including the first immediate one. Values below 1 act as 1.
    pub max_attempts: u32,
    /// Unit delay the strategy multiplies.
    pub base_delay: Duration,
    /// Ceiling on any single wait.
    pub max_delay: Duration,
    pub strategy: DelayStrategy,
}

/// Cycle length used by the client and method-response presets.
pub const DEFAULT_DELAY_CYCLE: u32 = 10;

impl BackoffSchedule {
    /// Fixed delay between probes.
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            strategy: DelayStrategy::Fixed,
        }
    }

    /// Linearly growing delay, capped at `max_delay`.
    pub fn linear(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: base_delay.saturating_mul(max_attempts.max(1)),
            strategy: DelayStrategy::Linear,
        }
    }

    /// Delay growing within a bounded cycle.
    pub fn cyclic(max_attempts: u32, base_delay: Duration, cycle: u32) -> Self {
        let cycle = cycle.max(1);
        Self {
            max_attempts,
            base_delay,
            max_delay: base_delay.saturating_mul(cycle),
            strategy: DelayStrategy::Cyclic { cycle },
        }
    }

    /// Schedule for resolving the connectivity client.
    pub fn client() -> Self {
        Self::cyclic(20, Duration::from_secs(1), DEFAULT_DELAY_CYCLE)
    }

    /// Schedule for resolving the twin handle.
    pub fn twin() -> Self {
        Self::linear(10, Duration::from_secs(1))
    }

    /// Schedule for awaiting a deferred method response.
    pub fn method_response() -> Self {
        Self::cyclic(20, Duration::from_secs(1), DEFAULT_DELAY_CYCLE)
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        if self.strategy == DelayStrategy::Linear {
            self.max_delay = self.base_delay.saturating_mul(max_attempts.max(1));
        }
        self
    }

    /// Change the unit delay, rescaling the ceiling with it.
    #[must_use]
    pub fn with_base_delay(self, base_delay: Duration) -> Self {
        match self.strategy {
            DelayStrategy::Fixed => Self::fixed(self.max_attempts, base_delay),
            DelayStrategy::Linear => Self::linear(self.max_attempts, base_delay),
            DelayStrategy::Cyclic { cycle } => Self::cyclic(self.max_attempts, base_delay, cycle),
        }
    }

    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Attempt budget with the lower bound applied.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Wait after the `attempt`-th failed probe (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let n = attempt.max(1);
        let delay = match self.strategy {
            DelayStrategy::Fixed => self.base_delay,
            DelayStrategy::Linear => self.base_delay.saturating_mul(n),
            DelayStrategy::Cyclic { cycle } => {
                self.base_delay.saturating_mul(((n - 1) % cycle.max(1)) + 1)
            }
        };
        delay.min(self.max_delay)
    }

    /// Total time spent waiting when every probe fails.
    ///
    /// There is no wait after the final probe, so this is the sum of
    /// `delay_for(1..attempts)`.
    pub fn total_wait(&self) -> Duration {
        (1..self.attempts())
            .map(|n| self.delay_for(n))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::client()
    }
}
