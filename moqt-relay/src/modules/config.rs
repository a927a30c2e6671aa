use std::time::Duration;

/// Tunables of the relay engine. Fields are public so embedders can adjust
/// what they need after `new()`.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Maximum number of objects retained per track; oldest locations are
    /// evicted first once exceeded.
    pub track_buffer_bound: usize,
    /// Maximum entries buffered per subscriber before the drop policy runs.
    pub outgoing_queue_capacity: usize,
    pub probe_interval: Duration,
    pub probe_timeout: Duration,
    /// Bytes delivered per probe.
    pub probe_size: usize,
    /// Largest relative bitrate increase applied per capacity estimate.
    pub bitrate_ramp_fraction: f64,
    /// Multiplied into the target on evidence of congestion.
    pub bitrate_decrease_factor: f64,
    pub min_bitrate: u64,
    pub max_bitrate: u64,
    pub initial_bitrate: u64,
    pub log_level: String,
}

impl RelayConfig {
    pub fn new() -> RelayConfig {
        RelayConfig {
            track_buffer_bound: 1024,
            outgoing_queue_capacity: 256,
            probe_interval: Duration::from_secs(2),
            probe_timeout: Duration::from_millis(500),
            probe_size: 64 * 1024,
            bitrate_ramp_fraction: 0.1,
            bitrate_decrease_factor: 0.7,
            min_bitrate: 100_000,
            max_bitrate: 50_000_000,
            initial_bitrate: 2_000_000,
            log_level: "INFO".to_string(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig::new()
    }
}
