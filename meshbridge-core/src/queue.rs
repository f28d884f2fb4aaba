//! Bounded event queue between the sensor producer and the scheduler
//!
//! Producers never block: when the queue is full the event is dropped and
//! counted. Events submitted through [`EventSink`] are also filtered to the
//! properties the bridge forwards. The consumer side waits for an event with a bounded timeout so
//! the periodic scheduler step always completes.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration};
use portable_atomic::{AtomicU32, Ordering};

use meshbridge_protocol::EventRecord;

use crate::error::BridgeError;

/// Default queue depth
pub const EVENT_QUEUE_CAPACITY: usize = 16;

/// Push-style interface offered to event producers
pub trait EventSink {
    /// Submit an event without blocking
    ///
    /// Backpressure is absorbed by the sink (the event is dropped and
    /// counted), so producers have nothing to handle. Properties the bridge
    /// does not forward are discarded.
    fn submit(&self, record: EventRecord);
}

/// FIFO of [`EventRecord`]s with a fixed capacity
pub struct EventQueue<M: RawMutex, const N: usize = EVENT_QUEUE_CAPACITY> {
    channel: Channel<M, EventRecord, N>,
    dropped: AtomicU32,
    filtered: AtomicU32,
}

impl<M: RawMutex, const N: usize> Default for EventQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> EventQueue<M, N> {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
            filtered: AtomicU32::new(0),
        }
    }

    /// Append an event, failing immediately if the queue is full
    pub fn enqueue(&self, record: EventRecord) -> Result<(), BridgeError> {
        self.channel.try_send(record).map_err(|_| {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            BridgeError::QueueFull
        })
    }

    /// Take the oldest event, waiting at most `timeout` for one to arrive
    pub async fn dequeue(&self, timeout: Duration) -> Result<EventRecord, BridgeError> {
        with_timeout(timeout, self.channel.receive())
            .await
            .map_err(|_| BridgeError::QueueTimeout)
    }

    /// Take the oldest event if there is one
    pub fn try_dequeue(&self) -> Option<EventRecord> {
        self.channel.try_receive().ok()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.channel.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Events dropped because the queue was full
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Events refused by [`EventSink::submit`] for their property id
    pub fn filtered(&self) -> u32 {
        self.filtered.load(Ordering::Relaxed)
    }
}

impl<M: RawMutex, const N: usize> EventSink for EventQueue<M, N> {
    fn submit(&self, record: EventRecord) {
        if !record.is_forwarded() {
            self.filtered.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let _ = self.enqueue(record);
    }
}
