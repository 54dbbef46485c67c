//! Fixed-header framing for supervised links.
//!
//! Every frame starts with an 8-byte header:
//! - a 4-byte frame type (`1` payload, `2` ping, `3` pong, anything else unknown)
//! - a 4-byte payload size (zero for ping/pong)
//!
//! Both fields use the byte order agreed between the peers. Payload bytes
//! follow the header directly and are consumed by the application.

pub mod codec;
pub mod error;
pub mod kind;
pub mod reader;
pub mod writer;

pub use codec::{
    check_payload_size, decode_header, encode_header, ByteOrder, FrameConfig, Header,
    DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use kind::{frame_type_name, FrameType, TYPE_PAYLOAD, TYPE_PING, TYPE_PONG};
pub use reader::{discard_payload, read_header, read_payload, read_payload_limited, FrameReader};
pub use writer::FrameWriter;
