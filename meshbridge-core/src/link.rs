//! Serial link abstraction
//!
//! The scheduler drives the link through [`LinkControl`]. Link drivers that
//! transmit from an async task use a [`TxGate`] to play the role of the
//! UART's transmit-ready interrupt enable.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, Ordering};

use crate::ring::TxBuffer;

/// Control surface of the serial link, as seen by the scheduler
///
/// `notify_ready_for_more` and `pause` must be safe to call repeatedly in
/// any order; the scheduler samples the link every period and does not
/// debounce.
pub trait LinkControl {
    /// Returns true if a peer is attached and ready to receive
    fn link_present(&mut self) -> bool;

    /// Resume draining the transmit buffer
    fn notify_ready_for_more(&mut self);

    /// Stop draining the transmit buffer
    fn pause(&mut self);
}

impl<T: LinkControl + ?Sized> LinkControl for &mut T {
    fn link_present(&mut self) -> bool {
        (**self).link_present()
    }

    fn notify_ready_for_more(&mut self) {
        (**self).notify_ready_for_more()
    }

    fn pause(&mut self) {
        (**self).pause()
    }
}

/// Transmit-ready enable flag with a wakeup
pub struct TxGate<M: RawMutex> {
    enabled: AtomicBool,
    kick: Signal<M, ()>,
}

impl<M: RawMutex> Default for TxGate<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> TxGate<M> {
    /// Create a gate in the disabled state
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            kick: Signal::new(),
        }
    }

    /// Allow transmission and wake the transmitter
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
        self.kick.signal(());
    }

    /// Stop transmission after the chunk in flight
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Wait until the gate is enabled
    pub async fn wait_enabled(&self) {
        while !self.is_enabled() {
            self.kick.wait().await;
        }
    }

    /// Wait for the next chunk of bytes to transmit
    ///
    /// Copies up to `out.len()` bytes out of `tx` once the gate is enabled.
    /// When the buffer runs dry the gate disables itself and the call
    /// waits for the next [`enable`](Self::enable).
    pub async fn next_chunk<B: RawMutex, const N: usize>(
        &self,
        tx: &TxBuffer<B, N>,
        out: &mut [u8],
    ) -> usize {
        loop {
            self.wait_enabled().await;

            let n = tx.drain_up_to(out);
            if n > 0 {
                return n;
            }

            self.disable();
            // A push may have landed between the drain and the disable
            if !tx.is_empty() {
                self.enable();
            }
        }
    }
}
