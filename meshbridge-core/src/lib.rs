//! Board-agnostic core of the Meshbridge firmware
//!
//! This crate contains everything between the sensor-event producer and
//! the physical serial link that does not depend on a specific chip:
//!
//! - Bounded event queue with drop accounting
//! - Transmit byte ring buffer shared with the link driver
//! - Periodic transmission scheduler
//! - Link abstraction traits and the transmit gate
//! - Inbound control-frame parser
//! - Configuration types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod inbound;
pub mod link;
pub mod queue;
pub mod ring;
pub mod scheduler;

pub use config::{BridgeConfig, ConfigError};
pub use error::BridgeError;
pub use inbound::{ControlParser, InboundHandler};
pub use link::{LinkControl, TxGate};
pub use queue::{EventQueue, EventSink, EVENT_QUEUE_CAPACITY};
pub use ring::{RingBuffer, TxBuffer, TX_BUFFER_CAPACITY};
pub use scheduler::{LinkMode, Scheduler, SchedulerStats, StepOutcome, StepReport};
