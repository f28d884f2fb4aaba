//! Bridge configuration
//!
//! Board-agnostic settings for the transmission pipeline. The firmware
//! bakes a validated copy in at build time from `bridge.toml`.

use embassy_time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default scheduler period
pub const DEFAULT_PERIOD_MS: u32 = 100;

/// Default bound on waiting for a queued event
pub const DEFAULT_DEQUEUE_TIMEOUT_MS: u32 = 100;

/// Default number of bytes handed to the UART per transmit-ready event
pub const DEFAULT_TX_CHUNK_LEN: u16 = 16;

/// Default interval between sensor samples
pub const DEFAULT_SENSOR_INTERVAL_MS: u32 = 3000;

/// Largest transmit chunk the link driver accepts
pub const MAX_TX_CHUNK_LEN: u16 = 64;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Period outside 10..=10000 ms
    Period,
    /// Dequeue timeout zero or longer than the period
    DequeueTimeout,
    /// Transmit chunk outside 1..=MAX_TX_CHUNK_LEN
    TxChunkLen,
    /// Sensor interval shorter than the period
    SensorInterval,
    /// Node address not a unicast address
    NodeAddress,
}

/// Transmission pipeline configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct BridgeConfig {
    /// Scheduler period in milliseconds
    pub period_ms: u32,
    /// Longest the scheduler waits for a queued event
    pub dequeue_timeout_ms: u32,
    /// Bytes moved to the UART per transmit round
    pub tx_chunk_len: u16,
    /// Interval between local sensor samples
    pub sensor_interval_ms: u32,
    /// Address reported for locally sampled events
    pub node_address: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BridgeConfig {
    /// Defaults usable in const context
    pub const DEFAULT: Self = Self {
        period_ms: DEFAULT_PERIOD_MS,
        dequeue_timeout_ms: DEFAULT_DEQUEUE_TIMEOUT_MS,
        tx_chunk_len: DEFAULT_TX_CHUNK_LEN,
        sensor_interval_ms: DEFAULT_SENSOR_INTERVAL_MS,
        node_address: 0x0001,
    };

    /// Check every field against its allowed range
    ///
    /// `const` so the firmware can reject a bad embedded config at compile time.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms < 10 || self.period_ms > 10_000 {
            return Err(ConfigError::Period);
        }
        if self.dequeue_timeout_ms == 0 || self.dequeue_timeout_ms > self.period_ms {
            return Err(ConfigError::DequeueTimeout);
        }
        if self.tx_chunk_len == 0 || self.tx_chunk_len > MAX_TX_CHUNK_LEN {
            return Err(ConfigError::TxChunkLen);
        }
        if self.sensor_interval_ms < self.period_ms {
            return Err(ConfigError::SensorInterval);
        }
        // Mesh unicast range
        if self.node_address == 0 || self.node_address > 0x7FFF {
            return Err(ConfigError::NodeAddress);
        }
        Ok(())
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms as u64)
    }

    pub fn dequeue_timeout(&self) -> Duration {
        Duration::from_millis(self.dequeue_timeout_ms as u64)
    }

    pub fn sensor_interval(&self) -> Duration {
        Duration::from_millis(self.sensor_interval_ms as u64)
    }
}
