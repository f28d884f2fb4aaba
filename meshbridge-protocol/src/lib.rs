//! Meshbridge Serial Protocol
//!
//! This crate defines the byte protocol spoken between the bridge device and
//! the host on the other end of the serial link. Sensor events collected by
//! the device are forwarded as `Publish` frames; the host may answer with
//! small control frames.
//!
//! # Frame Layout
//!
//! ```text
//! ┌───────┬──────┬──────┬──────────────┬───────┐
//! │ START │ TYPE │ SIZE │ PAYLOAD      │ CRC-8 │
//! │ 1B    │ 1B   │ 1B   │ 1B or 6B     │ 1B    │
//! └───────┴──────┴──────┴──────────────┴───────┘
//! ```
//!
//! SIZE is informational only. The payload layout is fixed by TYPE: every
//! scalar message carries exactly one byte, `Publish` carries six.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod crc;
pub mod events;
pub mod frame;
pub mod messages;

pub use crc::crc8;
pub use events::{EventRecord, SensorValue};
pub use frame::{CodecError, Direction, FRAME_START, MAX_FRAME_SIZE, MIN_FRAME_SIZE};
pub use messages::{Message, MessageType};
