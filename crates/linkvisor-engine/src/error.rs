use std::time::Duration;

use linkvisor_frame::{FrameError, FrameType};

/// Errors that can occur in link handler operations.
///
/// Only `init`, `start`, `stop` and `write` hand these to callers. The engine
/// threads use the same type for their diagnostics and recover in place.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Short or failed read on the inbound channel.
    #[error("inbound read failed: {0}")]
    TransportRead(#[source] FrameError),

    /// Short or failed write on an outbound channel.
    #[error("outbound write failed: {0}")]
    TransportWrite(#[source] FrameError),

    /// The supervisor mailbox held something other than a PONG.
    #[error("expected PONG from peer, got {got:?}")]
    Protocol { got: FrameType },

    /// No heartbeat reply arrived in time.
    #[error("no heartbeat reply within {0:?}")]
    Timeout(Duration),

    /// The reset strategy reported failure.
    #[error("transport reset failed: {0}")]
    ResetFailure(String),

    /// The link configuration was rejected at init.
    #[error("invalid link configuration: {0}")]
    Config(String),

    /// An engine thread could not be spawned.
    #[error("failed to spawn {engine} thread: {source}")]
    Spawn {
        engine: &'static str,
        source: std::io::Error,
    },

    /// An engine thread panicked before it could be joined.
    #[error("{engine} thread panicked")]
    Panicked { engine: &'static str },

    /// The handler has been stopped.
    #[error("link handler stopped")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, LinkError>;
