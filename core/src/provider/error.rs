use std::error::Error;

/// An error while decoding a chunk.
#[derive(Debug)]
pub enum DecodeError<DecoderError: Error> {
    /// A decode is already in flight. The provider never queues requests;
    /// wait for the current decode to settle before issuing another.
    DecodeInProgress,
    /// The requested range is reversed (`start > end`).
    InvalidRange { start: usize, end: usize },
    /// The decoder produced a batch whose size does not match the requested
    /// range. The batch was discarded and nothing was cached.
    FrameCountMismatch { expected: usize, actual: usize },
    /// The underlying decoder failed. Frames staged before the failure were
    /// discarded and nothing was cached.
    Decoder(DecoderError),
    /// The message channel to the decode server was full.
    ///
    /// In theory this should not happen, but if it does, retry once the
    /// in-flight request has settled.
    ServerChannelFull,
}

impl<DecoderError: Error> Error for DecodeError<DecoderError> {}

impl<DecoderError: Error> std::fmt::Display for DecodeError<DecoderError> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::DecodeInProgress => {
                write!(f, "A decode is already in progress")
            }
            DecodeError::InvalidRange { start, end } => {
                write!(f, "Frame range [{}, {}) is reversed", start, end)
            }
            DecodeError::FrameCountMismatch { expected, actual } => {
                write!(
                    f,
                    "Decoder produced {} frame(s) for a range of {}",
                    actual, expected
                )
            }
            DecodeError::Decoder(e) => write!(f, "Decoder error: {:?}", e),
            DecodeError::ServerChannelFull => {
                write!(f, "The message channel to the decode server is full")
            }
        }
    }
}
