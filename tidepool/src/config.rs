//! Configuration for the reactor run loop.

use std::time::Duration;

/// Configuration for reactor timing behavior.
#[derive(Clone, Debug)]
pub struct ReactorConfig {
    /// Timeout for each blocking readiness wait. The run loop never blocks
    /// longer than this before housekeeping runs again.
    pub select_timeout: Duration,

    /// Minimum spacing between factory tick passes. Zero ticks factories on
    /// every loop iteration.
    pub tick_interval: Duration,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            select_timeout: Duration::from_millis(50),
            tick_interval: Duration::ZERO,
        }
    }
}

impl ReactorConfig {
    /// Create a new configuration with the specified parameters.
    pub fn new(select_timeout: Duration, tick_interval: Duration) -> Self {
        Self {
            select_timeout,
            tick_interval,
        }
    }

    /// Create a configuration tuned for interactive hosts, with a shorter
    /// readiness wait so host timeouts fire promptly.
    pub fn responsive() -> Self {
        Self {
            select_timeout: Duration::from_millis(10),
            tick_interval: Duration::ZERO,
        }
    }
}
