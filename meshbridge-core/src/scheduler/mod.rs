//! Transmission scheduler
//!
//! A periodic control step that moves one event per period from the event
//! queue into the transmit buffer, gated on link presence.
//!
//! # Policy
//!
//! Each step samples the link:
//! - absent: the link's transmit path is paused and nothing is dequeued, so
//!   events accumulate in the queue (and get dropped there once it is full)
//! - present: one event is dequeued, framed as `Publish`, pushed into the
//!   transmit buffer, and the link is told to drain
//!
//! Errors are reported per step and never stop the loop.

mod transmit;

pub use transmit::Scheduler;

use meshbridge_protocol::EventRecord;

use crate::error::BridgeError;

/// Link state as last sampled by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkMode {
    #[default]
    LinkAbsent,
    LinkPresent,
}

/// Successful result of one scheduler step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// No peer on the link, transmission paused
    LinkAbsent,
    /// Link present, nothing queued
    Idle,
    /// One event framed and handed to the transmit buffer
    Sent(EventRecord),
}

/// Everything the run loop reports after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepReport {
    pub result: Result<StepOutcome, BridgeError>,
    pub mode: LinkMode,
    /// True if `mode` differs from the previous step
    pub mode_changed: bool,
}

/// Running counters kept by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SchedulerStats {
    pub steps: u32,
    pub frames_sent: u32,
    pub codec_errors: u32,
    pub queue_timeouts: u32,
    pub short_writes: u32,
    pub link_transitions: u32,
}

impl SchedulerStats {
    fn record(&mut self, result: &Result<StepOutcome, BridgeError>) {
        self.steps = self.steps.wrapping_add(1);
        match result {
            Ok(StepOutcome::Sent(_)) => self.frames_sent = self.frames_sent.wrapping_add(1),
            Ok(_) => {}
            Err(BridgeError::Codec(_)) | Err(BridgeError::FrameSize { .. }) => {
                self.codec_errors = self.codec_errors.wrapping_add(1)
            }
            Err(BridgeError::QueueTimeout) => {
                self.queue_timeouts = self.queue_timeouts.wrapping_add(1)
            }
            Err(BridgeError::ShortBufferWrite { .. }) => {
                self.short_writes = self.short_writes.wrapping_add(1)
            }
            // Producer-side error, never raised by a step
            Err(BridgeError::QueueFull) => {}
        }
    }
}
