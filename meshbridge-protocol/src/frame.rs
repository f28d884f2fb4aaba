//! Frame encoding and verification for the Meshbridge serial protocol.
//!
//! Frame format:
//! - START (1 byte): 0xAA synchronization byte
//! - TYPE (1 byte): message type identifier
//! - SIZE (1 byte): declared payload length, informational only
//! - PAYLOAD (1 or 6 bytes): layout fixed by TYPE
//! - CRC (1 byte): CRC-8 of every preceding byte, see [`crate::crc`]

use crate::crc::crc8;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xAA;

/// START + TYPE + SIZE
pub const HEADER_SIZE: usize = 3;

/// Shortest buffer that can hold a header and a CRC
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + 1;

/// Largest frame on the wire (a `Publish` frame)
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + 6 + 1;

/// Errors that can occur during frame encoding or decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Fewer than [`MIN_FRAME_SIZE`] bytes supplied
    LengthTooShort,
    /// First byte is not [`FRAME_START`]
    StartByteMismatch,
    /// CRC byte does not match the covered bytes
    CrcMismatch,
    /// Decoding this message type is not supported
    NotImplemented,
    /// Type code not assigned in this direction
    UnknownType(u8),
    /// CRC passed but the slice is not the exact frame length for its type
    LengthMismatch { expected: usize, actual: usize },
    /// Output buffer cannot hold the frame
    BufferTooSmall,
}

/// Which way a frame travels
///
/// Type code `0x01` is shared: towards the host it is a `Publish`, towards
/// the device it is a `Backlog`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Device to host
    ToHost,
    /// Host to device
    ToDevice,
}

/// A frame whose start byte and CRC have been checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame<'a> {
    /// Message type identifier
    pub msg_type: u8,
    /// Declared payload size (not trusted for layout)
    pub declared_size: u8,
    /// Bytes between the header and the CRC
    pub body: &'a [u8],
}

impl RawFrame<'_> {
    /// Total length of the frame this was parsed from
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + self.body.len() + 1
    }
}

/// Write a frame into `buffer`
///
/// Nothing is written unless the whole frame fits. Returns the number of
/// bytes written.
pub fn encode(
    msg_type: u8,
    declared_size: u8,
    payload: &[u8],
    buffer: &mut [u8],
) -> Result<usize, CodecError> {
    let frame_len = HEADER_SIZE + payload.len() + 1;
    if buffer.len() < MIN_FRAME_SIZE || buffer.len() < frame_len {
        return Err(CodecError::BufferTooSmall);
    }

    let crc_pos = HEADER_SIZE + payload.len();
    buffer[0] = FRAME_START;
    buffer[1] = msg_type;
    buffer[2] = declared_size;
    buffer[HEADER_SIZE..crc_pos].copy_from_slice(payload);
    buffer[crc_pos] = crc8(&buffer[..crc_pos]);

    Ok(frame_len)
}

/// Check the start byte and CRC of a complete frame
///
/// `buffer` must be trimmed to the frame's true length: the CRC is taken
/// from the last byte and covers the `buffer.len() - 1` bytes before it.
/// Trailing padding is not detected here: a valid frame followed by zero
/// bytes still passes, since the CRC has no final XOR and its residue is
/// zero. Length checks per message type happen in
/// [`Message::deserialize`](crate::Message::deserialize).
pub fn verify(buffer: &[u8]) -> Result<RawFrame<'_>, CodecError> {
    if buffer.len() < MIN_FRAME_SIZE {
        return Err(CodecError::LengthTooShort);
    }

    if buffer[0] != FRAME_START {
        return Err(CodecError::StartByteMismatch);
    }

    let crc_pos = buffer.len() - 1;
    if buffer[crc_pos] != crc8(&buffer[..crc_pos]) {
        return Err(CodecError::CrcMismatch);
    }

    Ok(RawFrame {
        msg_type: buffer[1],
        declared_size: buffer[2],
        body: &buffer[HEADER_SIZE..crc_pos],
    })
}
