pub use zoetrope_core::*;

#[cfg(feature = "decode-y4m")]
pub use zoetrope_decode_y4m::{DecodeError as Y4mDecodeError, Y4mDecoder};

#[cfg(feature = "decode-archive")]
pub use zoetrope_decode_archive::{ArchiveDecoder, DecodeError as ArchiveDecodeError};
