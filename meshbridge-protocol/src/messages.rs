//! Message types for the Meshbridge protocol
//!
//! Messages are divided into two categories:
//! - Device → Host: sensor events (`Publish`)
//! - Host → Device: control messages (`Poll`, `Backlog`, `Ack`, `Nack`)
//!
//! `Ack` and `Nack` are reserved for a future retransmission scheme and are
//! not acted upon yet.

use heapless::Vec;

use crate::events::{EventRecord, EVENT_RECORD_SIZE};
use crate::frame::{self, CodecError, Direction, HEADER_SIZE, MAX_FRAME_SIZE};

// Message type IDs
pub const MSG_POLL: u8 = 0x00;
pub const MSG_BACKLOG: u8 = 0x01;
pub const MSG_PUBLISH: u8 = 0x01;
pub const MSG_ACK: u8 = 0xFE;
pub const MSG_NACK: u8 = 0xFF;

/// Frame length of every non-`Publish` message
pub const SCALAR_FRAME_SIZE: usize = HEADER_SIZE + 1 + 1;

/// Frame length of a `Publish` message
pub const PUBLISH_FRAME_SIZE: usize = HEADER_SIZE + EVENT_RECORD_SIZE + 1;

/// Message type, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageType {
    Poll,
    Backlog,
    Publish,
    Ack,
    Nack,
}

impl MessageType {
    /// Wire type code
    pub fn code(self) -> u8 {
        match self {
            MessageType::Poll => MSG_POLL,
            MessageType::Backlog => MSG_BACKLOG,
            MessageType::Publish => MSG_PUBLISH,
            MessageType::Ack => MSG_ACK,
            MessageType::Nack => MSG_NACK,
        }
    }

    /// Resolve a wire type code for frames travelling in `direction`
    pub fn from_code(code: u8, direction: Direction) -> Option<Self> {
        match (code, direction) {
            (MSG_POLL, _) => Some(MessageType::Poll),
            (MSG_PUBLISH, Direction::ToHost) => Some(MessageType::Publish),
            (MSG_BACKLOG, Direction::ToDevice) => Some(MessageType::Backlog),
            (MSG_ACK, _) => Some(MessageType::Ack),
            (MSG_NACK, _) => Some(MessageType::Nack),
            _ => None,
        }
    }

    /// Exact frame length for this type
    pub fn frame_len(self) -> usize {
        match self {
            MessageType::Publish => PUBLISH_FRAME_SIZE,
            _ => SCALAR_FRAME_SIZE,
        }
    }

    /// Payload size written into the SIZE byte by default
    pub fn default_payload_size(self) -> u8 {
        match self {
            MessageType::Poll | MessageType::Ack | MessageType::Nack => 0,
            MessageType::Backlog => 1,
            MessageType::Publish => EVENT_RECORD_SIZE as u8,
        }
    }
}

/// A protocol message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// Host asks whether the device is alive
    Poll,
    /// Pending-event count or status byte
    Backlog(u8),
    /// Sensor event
    Publish(EventRecord),
    /// Positive acknowledgement (reserved)
    Ack,
    /// Negative acknowledgement (reserved)
    Nack,
}

impl Message {
    /// Type of this message
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Poll => MessageType::Poll,
            Message::Backlog(_) => MessageType::Backlog,
            Message::Publish(_) => MessageType::Publish,
            Message::Ack => MessageType::Ack,
            Message::Nack => MessageType::Nack,
        }
    }

    /// Single payload byte carried by scalar messages (0 if none)
    pub fn scalar(&self) -> u8 {
        match self {
            Message::Backlog(value) => *value,
            _ => 0,
        }
    }

    /// Exact number of bytes [`Message::serialize`] writes
    pub fn frame_len(&self) -> usize {
        self.message_type().frame_len()
    }

    /// Encode this message into `buffer`
    ///
    /// Returns the number of bytes written: 10 for `Publish`, 5 otherwise.
    /// Fails with [`CodecError::BufferTooSmall`] and writes nothing if the
    /// frame does not fit.
    pub fn serialize(&self, buffer: &mut [u8]) -> Result<usize, CodecError> {
        self.serialize_with_size_hint(self.message_type().default_payload_size(), buffer)
    }

    /// Encode this message with a caller-chosen SIZE byte
    ///
    /// The hint is written verbatim and has no effect on layout or length.
    pub fn serialize_with_size_hint(
        &self,
        declared_size: u8,
        buffer: &mut [u8],
    ) -> Result<usize, CodecError> {
        let code = self.message_type().code();
        match self {
            Message::Publish(record) => {
                let mut payload = [0u8; EVENT_RECORD_SIZE];
                record.write_to(&mut payload);
                frame::encode(code, declared_size, &payload, buffer)
            }
            _ => frame::encode(code, declared_size, &[self.scalar()], buffer),
        }
    }

    /// Encode this message into a heapless Vec
    pub fn to_frame_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, CodecError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.serialize(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| CodecError::BufferTooSmall)?;
        Ok(vec)
    }

    /// Decode a single frame travelling in `direction`
    ///
    /// `buffer` must hold exactly one frame with no trailing bytes; the CRC
    /// is read from its last byte. Checks run in order: length, start byte,
    /// CRC, type, exact frame length. The SIZE byte is ignored.
    ///
    /// Decoding `Publish` is not supported and yields
    /// [`CodecError::NotImplemented`]. Since the CRC is checked first, a
    /// corrupted `Publish` frame reports [`CodecError::CrcMismatch`] instead.
    pub fn deserialize(buffer: &[u8], direction: Direction) -> Result<Self, CodecError> {
        let raw = frame::verify(buffer)?;

        let msg_type = MessageType::from_code(raw.msg_type, direction)
            .ok_or(CodecError::UnknownType(raw.msg_type))?;

        let message = match msg_type {
            MessageType::Publish => return Err(CodecError::NotImplemented),
            MessageType::Poll => Message::Poll,
            MessageType::Backlog => Message::Backlog(raw.body.first().copied().unwrap_or(0)),
            MessageType::Ack => Message::Ack,
            MessageType::Nack => Message::Nack,
        };

        if buffer.len() != SCALAR_FRAME_SIZE {
            return Err(CodecError::LengthMismatch {
                expected: SCALAR_FRAME_SIZE,
                actual: buffer.len(),
            });
        }

        Ok(message)
    }
}

impl From<EventRecord> for Message {
    fn from(record: EventRecord) -> Self {
        Message::Publish(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crc::crc8;
    use crate::events::PROPERTY_AMBIENT_TEMPERATURE;
    use crate::frame::{FRAME_START, MIN_FRAME_SIZE};
    use proptest::prelude::*;

    fn publish() -> Message {
        Message::Publish(EventRecord::new(0x1234, PROPERTY_AMBIENT_TEMPERATURE, 2345))
    }

    #[test]
    fn test_serialize_publish() {
        let mut buffer = [0u8; 16];
        let len = publish().serialize(&mut buffer).unwrap();

        assert_eq!(len, PUBLISH_FRAME_SIZE);
        assert_eq!(
            &buffer[..9],
            &[FRAME_START, MSG_PUBLISH, 6, 0x12, 0x34, 0x00, 0x75, 0x09, 0x29]
        );
        assert_eq!(buffer[9], crc8(&buffer[..9]));
    }

    #[test]
    fn test_serialize_scalar_types() {
        let cases = [
            (Message::Poll, MSG_POLL, 0, 0),
            (Message::Backlog(7), MSG_BACKLOG, 1, 7),
            (Message::Ack, MSG_ACK, 0, 0),
            (Message::Nack, MSG_NACK, 0, 0),
        ];

        for (msg, code, size, value) in cases {
            let frame = msg.to_frame_vec().unwrap();
            assert_eq!(frame.len(), SCALAR_FRAME_SIZE);
            assert_eq!(&frame[..4], &[FRAME_START, code, size, value]);
            assert_eq!(frame[4], crc8(&frame[..4]));
        }
    }

    #[test]
    fn test_serialize_buffer_too_small() {
        let mut buffer = [0u8; 9];
        assert_eq!(publish().serialize(&mut buffer), Err(CodecError::BufferTooSmall));

        let mut buffer = [0u8; 4];
        assert_eq!(Message::Poll.serialize(&mut buffer), Err(CodecError::BufferTooSmall));

        let mut buffer = [0u8; 3];
        assert_eq!(Message::Poll.serialize(&mut buffer), Err(CodecError::BufferTooSmall));
    }

    #[test]
    fn test_deserialize_control_messages() {
        for msg in [Message::Poll, Message::Backlog(3), Message::Ack, Message::Nack] {
            let frame = msg.to_frame_vec().unwrap();
            assert_eq!(Message::deserialize(&frame, Direction::ToDevice), Ok(msg));
        }
    }

    #[test]
    fn test_deserialize_publish_not_implemented() {
        let frame = publish().to_frame_vec().unwrap();
        assert_eq!(
            Message::deserialize(&frame, Direction::ToHost),
            Err(CodecError::NotImplemented)
        );
    }

    #[test]
    fn test_corrupt_publish_reports_crc_first() {
        let mut frame = publish().to_frame_vec().unwrap();
        frame[5] ^= 0x10;
        assert_eq!(
            Message::deserialize(&frame, Direction::ToHost),
            Err(CodecError::CrcMismatch)
        );
    }

    #[test]
    fn test_empty_backlog_body_is_length_mismatch() {
        let mut buffer = [0u8; MIN_FRAME_SIZE];
        frame::encode(MSG_BACKLOG, 1, &[], &mut buffer).unwrap();
        assert_eq!(
            Message::deserialize(&buffer, Direction::ToDevice),
            Err(CodecError::LengthMismatch {
                expected: SCALAR_FRAME_SIZE,
                actual: MIN_FRAME_SIZE
            })
        );
    }

    #[test]
    fn test_type_one_depends_on_direction() {
        let frame = Message::Backlog(9).to_frame_vec().unwrap();
        assert_eq!(
            Message::deserialize(&frame, Direction::ToDevice),
            Ok(Message::Backlog(9))
        );
        assert_eq!(
            Message::deserialize(&frame, Direction::ToHost),
            Err(CodecError::NotImplemented)
        );
    }

    #[test]
    fn test_deserialize_unknown_type() {
        let mut buffer = [0u8; SCALAR_FRAME_SIZE];
        frame::encode(0x42, 0, &[0], &mut buffer).unwrap();
        assert_eq!(
            Message::deserialize(&buffer, Direction::ToDevice),
            Err(CodecError::UnknownType(0x42))
        );
    }

    #[test]
    fn test_deserialize_ignores_declared_size() {
        let mut buffer = [0u8; 16];
        let len = Message::Backlog(5)
            .serialize_with_size_hint(200, &mut buffer)
            .unwrap();
        assert_eq!(len, SCALAR_FRAME_SIZE);
        assert_eq!(
            Message::deserialize(&buffer[..len], Direction::ToDevice),
            Ok(Message::Backlog(5))
        );
    }

    #[test]
    fn test_deserialize_rejects_zero_padded_frame() {
        let mut buffer = [0u8; 8];
        Message::Ack.serialize(&mut buffer).unwrap();
        assert_eq!(
            Message::deserialize(&buffer, Direction::ToDevice),
            Err(CodecError::LengthMismatch {
                expected: SCALAR_FRAME_SIZE,
                actual: 8
            })
        );
    }

    #[test]
    fn test_deserialize_four_byte_frame() {
        // Header plus CRC, no payload byte
        let mut buffer = [FRAME_START, MSG_POLL, 0, 0];
        buffer[3] = crc8(&buffer[..3]);
        assert_eq!(
            Message::deserialize(&buffer, Direction::ToDevice),
            Err(CodecError::LengthMismatch {
                expected: SCALAR_FRAME_SIZE,
                actual: 4
            })
        );
    }

    fn control_message() -> impl Strategy<Value = Message> {
        prop_oneof![
            Just(Message::Poll),
            any::<u8>().prop_map(Message::Backlog),
            Just(Message::Ack),
            Just(Message::Nack),
        ]
    }

    fn any_message() -> impl Strategy<Value = Message> {
        prop_oneof![
            control_message(),
            (any::<u16>(), any::<u16>(), any::<u16>())
                .prop_map(|(a, p, v)| Message::Publish(EventRecord::new(a, p, v))),
        ]
    }

    proptest! {
        #[test]
        fn prop_control_roundtrip(msg in control_message()) {
            let frame = msg.to_frame_vec().unwrap();
            let decoded = Message::deserialize(&frame, Direction::ToDevice).unwrap();
            prop_assert_eq!(decoded.message_type(), msg.message_type());
            prop_assert_eq!(decoded.scalar(), msg.scalar());
        }

        #[test]
        fn prop_publish_always_ten_bytes(
            address in any::<u16>(),
            property_id in any::<u16>(),
            value in any::<u16>(),
            hint in any::<u8>(),
        ) {
            let msg = Message::Publish(EventRecord::new(address, property_id, value));
            let mut buffer = [0u8; 32];
            let len = msg.serialize_with_size_hint(hint, &mut buffer).unwrap();
            prop_assert_eq!(len, 10);
            prop_assert_eq!(buffer[2], hint);
            prop_assert_eq!(buffer[9], crc8(&buffer[..9]));
        }

        #[test]
        fn prop_single_bit_flip_detected(
            msg in any_message(),
            index in any::<prop::sample::Index>(),
            bit in 0u8..8,
        ) {
            let mut frame = msg.to_frame_vec().unwrap();
            // Skip the start byte (own error) and the CRC byte
            let pos = 1 + index.index(frame.len() - 2);
            frame[pos] ^= 1 << bit;
            let direction = match msg {
                Message::Publish(_) => Direction::ToHost,
                _ => Direction::ToDevice,
            };
            prop_assert_eq!(
                Message::deserialize(&frame, direction),
                Err(CodecError::CrcMismatch)
            );
        }

        #[test]
        fn prop_short_buffer_rejected(bytes in prop::collection::vec(any::<u8>(), 0..4)) {
            prop_assert_eq!(
                Message::deserialize(&bytes, Direction::ToDevice),
                Err(CodecError::LengthTooShort)
            );
        }

        #[test]
        fn prop_bad_start_byte_rejected(
            start in any::<u8>().prop_filter("not start", |b| *b != FRAME_START),
            rest in prop::collection::vec(any::<u8>(), 3..12),
        ) {
            let mut bytes = std::vec![start];
            bytes.extend_from_slice(&rest);
            prop_assert_eq!(
                Message::deserialize(&bytes, Direction::ToHost),
                Err(CodecError::StartByteMismatch)
            );
        }
    }
}
