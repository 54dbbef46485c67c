//! Frame type codes.
//!
//! Codes 1-3 are defined by the link protocol. Any other code is carried
//! through unchanged as [`FrameType::Unknown`] so the receiving side can
//! route it instead of rejecting it.

/// Application payload; `size` bytes follow the header.
pub const TYPE_PAYLOAD: u32 = 1;

/// Heartbeat request.
pub const TYPE_PING: u32 = 2;

/// Heartbeat reply.
pub const TYPE_PONG: u32 = 3;

/// The kind of a frame, as carried in the first header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Payload,
    Ping,
    Pong,
    Unknown(u32),
}

impl FrameType {
    /// Wire code of this frame type.
    pub fn code(self) -> u32 {
        match self {
            FrameType::Payload => TYPE_PAYLOAD,
            FrameType::Ping => TYPE_PING,
            FrameType::Pong => TYPE_PONG,
            FrameType::Unknown(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        frame_type_name(self.code())
    }
}

impl From<u32> for FrameType {
    fn from(code: u32) -> Self {
        match code {
            TYPE_PAYLOAD => FrameType::Payload,
            TYPE_PING => FrameType::Ping,
            TYPE_PONG => FrameType::Pong,
            other => FrameType::Unknown(other),
        }
    }
}

impl From<FrameType> for u32 {
    fn from(kind: FrameType) -> Self {
        kind.code()
    }
}

/// Returns a human-readable name for a frame type code.
pub fn frame_type_name(code: u32) -> &'static str {
    match code {
        TYPE_PAYLOAD => "PAYLOAD",
        TYPE_PING => "PING",
        TYPE_PONG => "PONG",
        _ => "UNKNOWN",
    }
}
