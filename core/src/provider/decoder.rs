use std::{error::Error, fmt::Debug};

use crate::Bitmap;

/// The two source representations a provider can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// One continuous bitstream. Frames are decoded sequentially in
    /// bitstream order, and the decoder carries its position across chunks.
    Video,
    /// Each chunk is an archive of independent still images, one per frame.
    /// No state is carried across chunks.
    Images,
}

/// A type that turns compressed chunk payloads into batches of decoded
/// frames.
///
/// The decoder is constructed inside the decode server's thread and lives
/// there for the provider's entire lifetime, so implementations are free to
/// keep persistent demuxer/decoder state across calls. There is no reset
/// operation; a fresh stream needs a fresh provider.
pub trait ChunkDecoder: Sized + 'static {
    /// Any additional options for the decoder, passed to [`new`].
    ///
    /// [`new`]: ChunkDecoder::new
    type AdditionalOpts: Send + Default + Debug;

    /// The error type while constructing the decoder.
    type OpenError: Error + Send;

    /// The error type while decoding a chunk.
    type DecodeError: Error + Send;

    /// Which source representation this decoder understands. Fixed for the
    /// life of any provider built on it.
    const MODE: SourceMode;

    /// Construct the decoder.
    fn new(additional_opts: Self::AdditionalOpts) -> Result<Self, Self::OpenError>;

    /// Decode one chunk payload into an ordered batch of frames.
    ///
    /// `num_frames` is the number of frames the chunk covers. Video decoders
    /// must pull exactly `num_frames` sequential frames from the bitstream;
    /// the `i`-th frame of the batch is assigned frame number `start + i` by
    /// the provider (positional correspondence). Images decoders decode every
    /// archive entry in order and may use `num_frames` as a capacity hint.
    ///
    /// The batch is staged: on error nothing of it reaches the frame cache.
    fn decode_chunk(
        &mut self,
        payload: &[u8],
        num_frames: usize,
    ) -> Result<Vec<Bitmap>, Self::DecodeError>;
}
