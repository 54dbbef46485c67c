use std::io::{ErrorKind, Write};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;
use tracing::trace;

use crate::codec::{encode_header, FrameConfig, Header, HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::kind::FrameType;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes complete frames to a shared outbound channel.
///
/// Clones share one lock. Each frame (header plus payload) is encoded into a
/// single buffer and written while that lock is held, so frames from
/// different clones never interleave on the channel.
pub struct FrameWriter<T> {
    shared: Arc<Mutex<WriterState<T>>>,
    config: FrameConfig,
}

struct WriterState<T> {
    inner: T,
    buf: BytesMut,
}

impl<T> Clone for FrameWriter<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            config: self.config.clone(),
        }
    }
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            shared: Arc::new(Mutex::new(WriterState {
                inner,
                buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            })),
            config,
        }
    }

    /// Send a PAYLOAD frame. Returns the number of payload bytes written.
    pub fn send_payload(&self, payload: &[u8]) -> Result<usize> {
        let size = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        })?;
        self.send(&Header::payload(size), payload)?;
        Ok(payload.len())
    }

    /// Send a header-only control frame (size 0).
    pub fn send_control(&self, kind: FrameType) -> Result<()> {
        self.send(&Header::new(kind, 0), &[])
    }

    fn send(&self, header: &Header, payload: &[u8]) -> Result<()> {
        let mut state = self.shared.lock();
        let WriterState { inner, buf } = &mut *state;

        buf.clear();
        buf.reserve(HEADER_SIZE + payload.len());
        encode_header(header, self.config.byte_order, buf);
        buf.extend_from_slice(payload);

        let mut offset = 0usize;
        while offset < buf.len() {
            match inner.write(&buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        flush(inner)?;
        trace!(kind = header.kind.name(), size = header.size, "frame written");
        Ok(())
    }

    /// Run `f` with exclusive access to the underlying stream.
    pub fn with_inner<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.shared.lock().inner)
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

fn flush<T: Write>(inner: &mut T) -> Result<()> {
    loop {
        match inner.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}

impl<T> std::fmt::Debug for FrameWriter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameWriter")
            .field("config", &self.config)
            .field("handles", &Arc::strong_count(&self.shared))
            .finish()
    }
}
