/// An error while decoding a chunk of YUV4MPEG2 video.
#[derive(Debug)]
pub enum DecodeError {
    /// The bitstream could not be parsed, or it ended before the requested
    /// number of frames could be pulled.
    Bitstream(y4m::Error),
    /// The stream uses a colorspace this decoder does not support (only the
    /// 8-bit formats are).
    UnsupportedColorspace(y4m::Colorspace),
}

impl std::error::Error for DecodeError {}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Bitstream(e) => write!(f, "Bitstream error: {:?}", e),
            DecodeError::UnsupportedColorspace(colorspace) => {
                write!(f, "Unsupported colorspace: {:?}", colorspace)
            }
        }
    }
}

impl From<y4m::Error> for DecodeError {
    fn from(e: y4m::Error) -> Self {
        DecodeError::Bitstream(e)
    }
}
