use crate::constants::DEFAULT_MAX_CONSECUTIVE_FAILURES;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Normal,
    ForcedReauth,
}

/// What the session must do after a failed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Propagate,
    ForceReauth,
}

/// Consecutive-failure counter owned by one identity.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    consecutive_failures: u32,
    threshold: u32,
    state: RetryState,
}

impl RetryPolicy {
    pub fn new(threshold: u32) -> Self {
        Self {
            consecutive_failures: 0,
            threshold: threshold.max(1),
            state: RetryState::Normal,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.state = RetryState::Normal;
    }

    /// Counts one failure. Reaching the threshold moves the policy into
    /// `ForcedReauth` until `finish_reauth` is called.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= self.threshold {
            self.state = RetryState::ForcedReauth;
            RetryDecision::ForceReauth
        } else {
            RetryDecision::Propagate
        }
    }

    /// Ends a forced re-authentication regardless of the login outcome.
    pub fn finish_reauth(&mut self) {
        self.consecutive_failures = 0;
        self.state = RetryState::Normal;
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONSECUTIVE_FAILURES)
    }
}
