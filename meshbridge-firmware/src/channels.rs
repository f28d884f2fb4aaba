//! Shared pipeline state
//!
//! Statics handed to the Embassy tasks. Everything here is lock-free or
//! guarded by a critical-section mutex, so any task may touch it.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use meshbridge_core::{EventQueue, TxBuffer, TxGate, EVENT_QUEUE_CAPACITY, TX_BUFFER_CAPACITY};

/// Sensor events waiting for the scheduler
pub static EVENT_QUEUE: EventQueue<CriticalSectionRawMutex, EVENT_QUEUE_CAPACITY> =
    EventQueue::new();

/// Framed bytes waiting for the UART
pub static TX_BUFFER: TxBuffer<CriticalSectionRawMutex, TX_BUFFER_CAPACITY> = TxBuffer::new();

/// Transmit-ready enable, driven by the scheduler through the link
pub static TX_GATE: TxGate<CriticalSectionRawMutex> = TxGate::new();

/// Stops the scheduler loop at its next period
pub static SCHEDULER_STOP: Signal<CriticalSectionRawMutex, ()> = Signal::new();
