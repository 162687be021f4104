use std::io;

/// An error while decoding a chunk of archived still images.
#[derive(Debug)]
pub enum DecodeError {
    /// The archive itself could not be read.
    Archive(io::Error),
    /// An entry could not be decoded as an image.
    Image {
        entry: String,
        source: image::ImageError,
    },
}

impl std::error::Error for DecodeError {}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Archive(e) => write!(f, "Archive error: {:?}", e),
            DecodeError::Image { entry, source } => {
                write!(f, "Entry {:?} could not be decoded: {:?}", entry, source)
            }
        }
    }
}

impl From<io::Error> for DecodeError {
    fn from(e: io::Error) -> Self {
        DecodeError::Archive(e)
    }
}
