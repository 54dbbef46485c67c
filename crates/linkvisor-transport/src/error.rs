use std::io;
use std::path::PathBuf;

/// Errors raised by link transport channels.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind a listening socket.
    #[error("failed to bind to {path}: {source}")]
    Bind { path: PathBuf, source: io::Error },

    /// Failed to connect to a listening socket.
    #[error("failed to connect to {path}: {source}")]
    Connect { path: PathBuf, source: io::Error },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(io::Error),

    /// An I/O error occurred on the channel.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    /// The socket path does not fit in `sockaddr_un`.
    #[error("socket path too long ({len} bytes, max {max}): {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// The channel was stopped by its owner and has not been restarted.
    #[error("channel stopped")]
    Stopped,

    /// The channel was closed for good.
    #[error("channel closed")]
    Closed,
}

impl TransportError {
    /// Convert into an `io::Error` so the failure can travel through `Read`/`Write`.
    pub fn into_io(self) -> io::Error {
        match self {
            TransportError::Io(err) | TransportError::Accept(err) => err,
            TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => source,
            TransportError::Stopped => io::Error::new(io::ErrorKind::NotConnected, self),
            TransportError::Closed => io::Error::new(io::ErrorKind::BrokenPipe, self),
            other => io::Error::other(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_maps_to_not_connected() {
        let err = TransportError::Stopped.into_io();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        assert_eq!(err.to_string(), "channel stopped");
    }

    #[test]
    fn io_passes_through_unchanged() {
        let err = TransportError::Io(io::Error::from(io::ErrorKind::TimedOut)).into_io();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
