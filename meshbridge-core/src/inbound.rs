//! Inbound (host to device) byte handling
//!
//! Raw bytes read from the link are handed to an [`InboundHandler`]. The
//! [`ControlParser`] turns that byte stream into control messages using the
//! protocol decoder.

use heapless::Vec;

use meshbridge_protocol::frame::FRAME_START;
use meshbridge_protocol::messages::SCALAR_FRAME_SIZE;
use meshbridge_protocol::{CodecError, Direction, Message};

/// Receives raw bytes from the link driver
pub trait InboundHandler {
    fn on_bytes(&mut self, bytes: &[u8]);
}

/// State machine for extracting control frames from a byte stream
///
/// Control frames are always [`SCALAR_FRAME_SIZE`] bytes long. Bytes are
/// skipped until a start byte is seen; after that, a full frame is
/// collected and decoded in one go. If it fails to decode, collection
/// restarts at the next start byte inside the rejected bytes, so a
/// truncated frame cannot hide the one behind it.
#[derive(Debug, Clone)]
pub struct ControlParser {
    state: ParseState,
    buffer: Vec<u8, SCALAR_FRAME_SIZE>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Waiting for START byte
    WaitingForStart,
    /// Collecting the rest of the frame
    Collecting,
}

impl Default for ControlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::WaitingForStart,
            buffer: Vec::new(),
        }
    }

    /// Reset the parser state
    pub fn reset(&mut self) {
        self.state = ParseState::WaitingForStart;
        self.buffer.clear();
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(msg))` when a complete valid frame is decoded,
    /// `Ok(None)` when more bytes are needed, or `Err` when a complete frame
    /// fails to decode.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Message>, CodecError> {
        match self.state {
            ParseState::WaitingForStart => {
                if byte == FRAME_START {
                    self.buffer.clear();
                    // Cannot fail, buffer was just cleared
                    let _ = self.buffer.push(byte);
                    self.state = ParseState::Collecting;
                }
                Ok(None)
            }
            ParseState::Collecting => {
                let _ = self.buffer.push(byte);
                if self.buffer.len() < SCALAR_FRAME_SIZE {
                    return Ok(None);
                }

                match Message::deserialize(&self.buffer, Direction::ToDevice) {
                    Ok(msg) => {
                        self.reset();
                        Ok(Some(msg))
                    }
                    Err(e) => {
                        self.resync();
                        Err(e)
                    }
                }
            }
        }
    }

    /// Drop a rejected frame up to the next start byte it contains
    fn resync(&mut self) {
        match self.buffer[1..].iter().position(|&b| b == FRAME_START) {
            Some(offset) => {
                let rest: Vec<u8, SCALAR_FRAME_SIZE> =
                    self.buffer[offset + 1..].iter().copied().collect();
                self.buffer = rest;
                self.state = ParseState::Collecting;
            }
            None => self.reset(),
        }
    }

    /// Feed a run of bytes, calling `on_frame` for every complete frame
    pub fn feed_bytes<F>(&mut self, bytes: &[u8], mut on_frame: F)
    where
        F: FnMut(Result<Message, CodecError>),
    {
        for &byte in bytes {
            match self.feed(byte) {
                Ok(Some(msg)) => on_frame(Ok(msg)),
                Ok(None) => {}
                Err(e) => on_frame(Err(e)),
            }
        }
    }
}
