//! Engine timing and capacity configuration.
//!
//! Defaults match the reference appliance: a 200 ms presence probe cadence
//! with a 1 s removal tolerance, a 256 byte NDEF decode buffer and a 100 ms
//! bounded wait when handing events to consumers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between discovery attempts while no device is in the field.
    pub idle_poll_delay_ms: u64,
    /// Cadence of presence probes once a tag has been accepted.
    pub presence_period_ms: u64,
    /// How long a tag may fail presence probes before it counts as removed.
    pub presence_tolerance_ms: u64,
    /// Bounded wait when enqueueing a lifecycle event; on expiry the event
    /// is dropped rather than stalling the lifecycle loop.
    pub event_timeout_ms: u64,
    /// Capacity of the lifecycle event channel.
    pub event_queue_depth: usize,
    /// Capacity of the NDEF decode buffer; larger raw messages are rejected.
    pub ndef_buf_size: usize,
    /// Delay between bring-up retries when the front-end fails to init.
    pub init_retry_delay_ms: u64,
    /// ASCII marker that must occur in a tag payload for it to be accepted.
    pub marker: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            idle_poll_delay_ms: 50,
            presence_period_ms: 200,
            presence_tolerance_ms: 1000,
            event_timeout_ms: 100,
            event_queue_depth: 8,
            ndef_buf_size: 256,
            init_retry_delay_ms: 500,
            marker: "scp:".into(),
        }
    }
}

impl EngineConfig {
    pub fn idle_poll_delay(&self) -> Duration {
        Duration::from_millis(self.idle_poll_delay_ms)
    }

    pub fn presence_period(&self) -> Duration {
        Duration::from_millis(self.presence_period_ms)
    }

    pub fn event_timeout(&self) -> Duration {
        Duration::from_millis(self.event_timeout_ms)
    }

    pub fn init_retry_delay(&self) -> Duration {
        Duration::from_millis(self.init_retry_delay_ms)
    }

    /// Consecutive probe misses that declare a tag removed. Rounds the
    /// tolerance up to whole probe periods, never below one.
    pub fn presence_threshold(&self) -> u32 {
        self.presence_tolerance_ms
            .div_ceil(self.presence_period_ms.max(1))
            .max(1) as u32
    }
}
