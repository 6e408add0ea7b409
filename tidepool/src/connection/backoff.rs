//! Reconnection policy with exponential backoff.
//!
//! Connection implementations own a [`ReconnectState`] and consult it from
//! their `reconnect` and tick paths: record a failure after each lost
//! connection, gate new attempts on [`ReconnectState::should_attempt`], and
//! reset once a connection is established again.

use std::time::{Duration, Instant};

/// Maximum number of consecutive reconnection attempts before giving up.
pub const MAX_RETRIES: u32 = 20;

/// Delay before the first reconnection attempt.
pub const INITIAL_RECONNECT_DELAY: Duration = Duration::from_millis(500);

/// Ceiling for the backoff delay between attempts.
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Multiplier applied to the delay after each failure.
const RECONNECT_DELAY_GROWTH: u32 = 2;

/// Parameters governing reconnection behavior.
#[derive(Clone, Debug)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,

    /// Ceiling the growing delay never exceeds.
    pub max_delay: Duration,

    /// Maximum consecutive failures before reconnection is abandoned.
    /// None means unlimited retries.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: INITIAL_RECONNECT_DELAY,
            max_delay: MAX_RECONNECT_DELAY,
            max_retries: Some(MAX_RETRIES),
        }
    }
}

impl ReconnectPolicy {
    /// Create a policy tuned for low-latency local networking.
    pub fn local_network() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            max_retries: Some(10),
        }
    }
}

/// State for managing reconnections with exponential backoff.
#[derive(Debug, Clone)]
pub struct ReconnectState {
    /// Current backoff delay.
    current_delay: Duration,

    /// Number of consecutive failures.
    failure_count: u32,

    /// Time of the most recent failure.
    last_failure: Option<Instant>,
}

impl ReconnectState {
    /// Create fresh state from a policy.
    pub fn new(policy: &ReconnectPolicy) -> Self {
        Self {
            current_delay: policy.initial_delay,
            failure_count: 0,
            last_failure: None,
        }
    }

    /// Record a failed attempt at `now`, growing the delay toward the cap.
    pub fn record_failure(&mut self, now: Instant, policy: &ReconnectPolicy) {
        self.failure_count += 1;
        self.last_failure = Some(now);
        self.current_delay = std::cmp::min(
            self.current_delay * RECONNECT_DELAY_GROWTH,
            policy.max_delay,
        );
    }

    /// True when enough time has passed since the last failure for a new
    /// attempt. Always true before the first failure.
    pub fn should_attempt(&self, now: Instant) -> bool {
        match self.last_failure {
            Some(at) => now.saturating_duration_since(at) >= self.current_delay,
            None => true,
        }
    }

    /// True once the consecutive failure count has used up the policy's
    /// retry budget.
    pub fn retries_exhausted(&self, policy: &ReconnectPolicy) -> bool {
        match policy.max_retries {
            Some(max) => self.failure_count >= max,
            None => false,
        }
    }

    /// Reset after a successful connection.
    pub fn reset(&mut self, policy: &ReconnectPolicy) {
        self.current_delay = policy.initial_delay;
        self.failure_count = 0;
        self.last_failure = None;
    }

    /// Delay that gates the next attempt.
    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    /// Number of consecutive failures recorded.
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }
}
