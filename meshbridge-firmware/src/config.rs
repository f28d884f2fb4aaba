//! Embedded bridge configuration
//!
//! Generated by build.rs from bridge.toml. Edit that file and rebuild to
//! change it.

use meshbridge_core::BridgeConfig;

include!(concat!(env!("OUT_DIR"), "/bridge_config.rs"));

const _: () = assert!(
    EMBEDDED_CONFIG.validate().is_ok(),
    "bridge.toml: inconsistent settings (check period_ms, dequeue_timeout_ms, tx_chunk_len, sensor_interval_ms, node_address)"
);
