mod decoder;
mod frame_provider;
mod server;
mod store;

pub mod error;


pub(crate) use server::DecodeServer;

pub use decoder::{ChunkDecoder, SourceMode};
pub use error::DecodeError;
pub use frame_provider::FrameProvider;
pub use store::ChunkStore;

use crate::Bitmap;

pub(crate) enum ClientToServerMsg {
    DecodeChunk {
        payload: Vec<u8>,
        start: usize,
        end: usize,
    },
}

pub(crate) enum ServerToClientMsg<D: ChunkDecoder> {
    DecodeRes {
        frames: Vec<Bitmap>,
        start: usize,
        end: usize,
    },
    DecodeFailed {
        error: D::DecodeError,
    },
}

/// Options for a [`FrameProvider`].
pub struct ProviderOptions<D: ChunkDecoder> {
    /// The number of decoded chunk ranges to retain in the cache. Once a
    /// decode pushes the count past this bound, the oldest range and all of
    /// its frames are evicted.
    ///
    /// This is `1` by default.
    pub capacity: usize,

    /// The size of the message channels between the provider and the decode
    /// server.
    ///
    /// This will be a sane default if `None`.
    pub server_msg_channel_size: Option<usize>,

    /// Any additional decoder-specific options.
    pub additional_opts: D::AdditionalOpts,
}

impl<D: ChunkDecoder> Default for ProviderOptions<D> {
    fn default() -> Self {
        ProviderOptions {
            capacity: crate::DEFAULT_CAPACITY,
            server_msg_channel_size: None,
            additional_opts: Default::default(),
        }
    }
}
