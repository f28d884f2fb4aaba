//! Transmit byte ring buffer
//!
//! [`RingBuffer`] is the plain data structure; [`TxBuffer`] wraps it in a
//! blocking mutex so the scheduler (producer) and the link transmit path
//! (consumer) can share it. Every operation on [`TxBuffer`] runs inside one
//! short critical section and never waits.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Default transmit buffer size in bytes
pub const TX_BUFFER_CAPACITY: usize = 256;

/// Fixed-capacity byte ring
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    /// Index of the oldest byte
    head: usize,
    /// Number of stored bytes
    len: usize,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes that can still be pushed
    pub fn free(&self) -> usize {
        N - self.len
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Append as much of `data` as fits
    ///
    /// Returns the number of bytes accepted. Bytes beyond the free space
    /// are not stored.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let count = data.len().min(self.free());
        if count == 0 {
            return 0;
        }

        let tail = (self.head + self.len) % N;
        let first = count.min(N - tail);
        self.buf[tail..tail + first].copy_from_slice(&data[..first]);
        self.buf[..count - first].copy_from_slice(&data[first..count]);
        self.len += count;
        count
    }

    /// Borrow up to `max_len` of the oldest bytes without removing them
    ///
    /// The slice is contiguous, so near the wrap point it may be shorter
    /// than both `max_len` and [`len`](Self::len).
    pub fn claim(&self, max_len: usize) -> &[u8] {
        let contiguous = self.len.min(N - self.head);
        let count = contiguous.min(max_len);
        &self.buf[self.head..self.head + count]
    }

    /// Remove `count` bytes from the front, returning how many were removed
    pub fn commit(&mut self, count: usize) -> usize {
        let count = count.min(self.len);
        self.len -= count;
        self.head = if self.len == 0 {
            0
        } else {
            (self.head + count) % N
        };
        count
    }

    /// Move up to `out.len()` bytes into `out`
    pub fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let mut copied = 0;
        while copied < out.len() {
            let chunk = self.claim(out.len() - copied);
            if chunk.is_empty() {
                break;
            }
            let n = chunk.len();
            out[copied..copied + n].copy_from_slice(chunk);
            self.commit(n);
            copied += n;
        }
        copied
    }
}

/// Transmit buffer shared between the scheduler and the link driver
pub struct TxBuffer<M: RawMutex, const N: usize = TX_BUFFER_CAPACITY> {
    ring: Mutex<M, RefCell<RingBuffer<N>>>,
}

impl<M: RawMutex, const N: usize> Default for TxBuffer<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> TxBuffer<M, N> {
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(RingBuffer::new())),
        }
    }

    /// Append as much of `data` as fits, returning the accepted count
    pub fn push(&self, data: &[u8]) -> usize {
        self.ring.lock(|ring| ring.borrow_mut().push(data))
    }

    /// Claim up to `max_len` bytes, hand them to `write`, and commit what it
    /// consumed
    ///
    /// `write` runs inside the critical section and must not block. It
    /// returns how many of the offered bytes it took; anything above the
    /// offered length is ignored. Returns the number of bytes committed.
    pub fn transmit_with<F>(&self, max_len: usize, write: F) -> usize
    where
        F: FnOnce(&[u8]) -> usize,
    {
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            let written = {
                let chunk = ring.claim(max_len);
                write(chunk).min(chunk.len())
            };
            ring.commit(written)
        })
    }

    /// Move up to `out.len()` bytes into `out`
    pub fn drain_up_to(&self, out: &mut [u8]) -> usize {
        self.ring.lock(|ring| ring.borrow_mut().drain_into(out))
    }

    pub fn len(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn free(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().free())
    }

    pub fn clear(&self) {
        self.ring.lock(|ring| ring.borrow_mut().clear())
    }
}
