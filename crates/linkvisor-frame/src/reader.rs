use std::io::{ErrorKind, Read};

use bytes::Bytes;

use crate::codec::{
    check_payload_size, decode_header, ByteOrder, FrameConfig, Header, DEFAULT_MAX_PAYLOAD,
    HEADER_SIZE,
};
use crate::error::{FrameError, Result};

/// Reads frame headers from a byte stream.
///
/// Unlike a buffering decoder it never reads past the header: the payload
/// that follows is consumed straight from the stream by whoever handles it.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next header (blocking).
    pub fn read_header(&mut self) -> Result<Header> {
        read_header(&mut self.inner, self.config.byte_order)
    }

    /// Read a payload of `size` bytes following a PAYLOAD header.
    ///
    /// Sizes above the configured maximum fail with
    /// [`FrameError::PayloadTooLarge`] and leave the payload unread.
    pub fn read_payload(&mut self, size: u32) -> Result<Bytes> {
        read_payload_limited(&mut self.inner, size, self.config.max_payload_size)
    }

    /// Update the maximum accepted payload size.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

/// Read exactly one header from `reader`.
///
/// End of stream before the first byte is [`FrameError::ConnectionClosed`];
/// end of stream part-way through is [`FrameError::MalformedHeader`].
pub fn read_header<R: Read + ?Sized>(reader: &mut R, order: ByteOrder) -> Result<Header> {
    let mut buf = [0u8; HEADER_SIZE];
    let mut filled = 0usize;

    while filled < HEADER_SIZE {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Err(FrameError::ConnectionClosed),
            Ok(0) => return decode_header(&buf[..filled], order),
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }

    decode_header(&buf, order)
}

/// Read a complete payload of `size` bytes, up to [`DEFAULT_MAX_PAYLOAD`].
pub fn read_payload<R: Read + ?Sized>(reader: &mut R, size: u32) -> Result<Bytes> {
    read_payload_limited(reader, size, DEFAULT_MAX_PAYLOAD)
}

/// Read a complete payload of `size` bytes, refusing sizes above `max`.
///
/// The size check runs before the buffer is allocated. On rejection no
/// bytes are consumed, so the caller may still [`discard_payload`].
pub fn read_payload_limited<R: Read + ?Sized>(
    reader: &mut R,
    size: u32,
    max: usize,
) -> Result<Bytes> {
    let mut payload = vec![0u8; check_payload_size(size, max)?];
    reader.read_exact(&mut payload).map_err(|err| match err.kind() {
        ErrorKind::UnexpectedEof => FrameError::ConnectionClosed,
        _ => FrameError::Io(err),
    })?;
    Ok(Bytes::from(payload))
}

/// Consume and drop `size` payload bytes, keeping the stream aligned on the
/// next header.
pub fn discard_payload<R: Read + ?Sized>(reader: &mut R, size: u32) -> Result<()> {
    let copied = std::io::copy(&mut reader.take(u64::from(size)), &mut std::io::sink())?;
    if copied < u64::from(size) {
        return Err(FrameError::ConnectionClosed);
    }
    Ok(())
}
