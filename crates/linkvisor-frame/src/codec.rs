use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::kind::FrameType;

/// Frame header: type (4) + size (4) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Default maximum payload size accepted when reading (16 MiB).
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Byte order of the two header fields.
///
/// Both peers must be configured identically; nothing on the wire
/// identifies the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// Fixed-size header prepended to every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: FrameType,
    /// Declared payload length for PAYLOAD frames, zero for control frames.
    pub size: u32,
}

impl Header {
    pub fn new(kind: FrameType, size: u32) -> Self {
        Self { kind, size }
    }

    pub fn payload(size: u32) -> Self {
        Self::new(FrameType::Payload, size)
    }

    pub fn ping() -> Self {
        Self::new(FrameType::Ping, 0)
    }

    pub fn pong() -> Self {
        Self::new(FrameType::Pong, 0)
    }

    /// Encode into the 8-byte wire form.
    ///
    /// ```text
    /// ┌──────────────┬──────────────┐
    /// │ Type (4B)    │ Size (4B)    │
    /// │ 1/2/3/other  │ payload len  │
    /// └──────────────┴──────────────┘
    /// ```
    pub fn encode(&self, order: ByteOrder) -> [u8; HEADER_SIZE] {
        let (kind, size) = match order {
            ByteOrder::Little => (self.kind.code().to_le_bytes(), self.size.to_le_bytes()),
            ByteOrder::Big => (self.kind.code().to_be_bytes(), self.size.to_be_bytes()),
        };
        let mut out = [0u8; HEADER_SIZE];
        out[..4].copy_from_slice(&kind);
        out[4..].copy_from_slice(&size);
        out
    }
}

/// Append an encoded header to `dst`.
pub fn encode_header(header: &Header, order: ByteOrder, dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE);
    dst.put_slice(&header.encode(order));
}

/// Decode a header from the first [`HEADER_SIZE`] bytes of `src`.
///
/// Bytes past the header are ignored; fewer than [`HEADER_SIZE`] bytes is
/// [`FrameError::MalformedHeader`].
pub fn decode_header(src: &[u8], order: ByteOrder) -> Result<Header> {
    if src.len() < HEADER_SIZE {
        return Err(FrameError::MalformedHeader {
            len: src.len(),
            expected: HEADER_SIZE,
        });
    }

    let mut kind = [0u8; 4];
    let mut size = [0u8; 4];
    kind.copy_from_slice(&src[..4]);
    size.copy_from_slice(&src[4..HEADER_SIZE]);

    let (kind, size) = match order {
        ByteOrder::Little => (u32::from_le_bytes(kind), u32::from_le_bytes(size)),
        ByteOrder::Big => (u32::from_be_bytes(kind), u32::from_be_bytes(size)),
    };

    Ok(Header {
        kind: FrameType::from(kind),
        size,
    })
}

/// Configuration shared by frame readers and writers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Header byte order. Default: little-endian.
    pub byte_order: ByteOrder,
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::default(),
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl FrameConfig {
    pub fn with_byte_order(byte_order: ByteOrder) -> Self {
        Self {
            byte_order,
            ..Self::default()
        }
    }
}

/// Reject a declared payload size above `max` before anything is allocated.
pub fn check_payload_size(size: u32, max: usize) -> Result<usize> {
    let size = size as usize;
    if size > max {
        return Err(FrameError::PayloadTooLarge { size, max });
    }
    Ok(size)
}
