use std::time;

mod bitmap;
mod provider;

pub use bitmap::Bitmap;
pub use provider::{
    ChunkDecoder, ChunkStore, DecodeError, FrameProvider, ProviderOptions, SourceMode,
};

/// How long polling loops sleep between checks.
const SERVER_WAIT_TIME: time::Duration = time::Duration::from_millis(1);

/// The default number of decoded chunk ranges a provider retains before
/// evicting the oldest one.
pub const DEFAULT_CAPACITY: usize = 1;
