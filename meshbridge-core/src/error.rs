//! Pipeline error type

use meshbridge_protocol::CodecError;

/// Errors raised between the producer and the transmit buffer
///
/// None of these are fatal: the scheduler reports them and carries on with
/// the next period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// Frame encoding failed
    Codec(CodecError),
    /// Event queue was full, the event was dropped
    QueueFull,
    /// No event arrived within the dequeue timeout
    QueueTimeout,
    /// Encoder produced a frame of unexpected length
    FrameSize { written: usize },
    /// Transmit buffer accepted only part of a frame
    ///
    /// The partial frame is already queued for the wire, so the host sees a
    /// truncated frame and has to resynchronise on the next start byte.
    ShortBufferWrite { written: usize, expected: usize },
}

impl BridgeError {
    /// Returns true if this error left a partial frame in the byte stream
    pub fn is_stream_corruption(&self) -> bool {
        matches!(self, BridgeError::ShortBufferWrite { .. })
    }
}

impl From<CodecError> for BridgeError {
    fn from(e: CodecError) -> Self {
        BridgeError::Codec(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_short_write_corrupts_stream() {
        assert!(BridgeError::ShortBufferWrite {
            written: 3,
            expected: 10
        }
        .is_stream_corruption());
        assert!(!BridgeError::QueueFull.is_stream_corruption());
        assert!(!BridgeError::QueueTimeout.is_stream_corruption());
        assert!(!BridgeError::Codec(CodecError::BufferTooSmall).is_stream_corruption());
    }

    #[test]
    fn test_from_codec_error() {
        let e: BridgeError = CodecError::CrcMismatch.into();
        assert_eq!(e, BridgeError::Codec(CodecError::CrcMismatch));
    }
}
