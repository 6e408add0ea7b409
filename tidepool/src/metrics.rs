//! Metrics collection for reactor activity.

/// Cumulative counters describing reactor activity.
#[derive(Debug, Clone, Default)]
pub struct ReactorMetrics {
    /// Total number of readiness passes that reached the wait primitive.
    pub select_passes: u64,

    /// Total number of connections registered via connect or listen.
    pub connections_registered: u64,

    /// Total number of reconnections the reactor forced on connections.
    pub reconnections_forced: u64,

    /// Total number of write operations that failed during dispatch.
    pub write_failures: u64,

    /// Total number of read operations that failed during dispatch.
    pub read_failures: u64,

    /// Total number of failures of the wait primitive itself.
    pub wait_failures: u64,
}

impl ReactorMetrics {
    /// Create a zeroed metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_select_pass(&mut self) {
        self.select_passes += 1;
    }

    pub(crate) fn record_registration(&mut self) {
        self.connections_registered += 1;
    }

    pub(crate) fn record_reconnection(&mut self) {
        self.reconnections_forced += 1;
    }

    pub(crate) fn record_write_failure(&mut self) {
        self.write_failures += 1;
    }

    pub(crate) fn record_read_failure(&mut self) {
        self.read_failures += 1;
    }

    pub(crate) fn record_wait_failure(&mut self) {
        self.wait_failures += 1;
    }
}
