/// Errors that can occur while encoding, decoding, reading or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes than a full header were available.
    #[error("malformed header ({len} of {expected} bytes)")]
    MalformedHeader { len: usize, expected: usize },

    /// The payload exceeds the configured maximum or the 32-bit size field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred on the underlying channel.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel reached end of stream on a frame boundary.
    #[error("channel closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
