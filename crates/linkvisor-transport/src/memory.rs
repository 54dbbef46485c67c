//! In-process byte pipe with restartable semantics.
//!
//! Behaves like a driver-backed queue: [`PipeControl::stop`] discards any
//! buffered bytes and fails every pending and future read or write until
//! [`PipeControl::start`] is called. This is what a reset strategy does to a
//! serial port, so the pipe lets link handlers be exercised end to end
//! without hardware.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{InboundChannel, Interrupt};

#[derive(Debug, Default)]
struct PipeState {
    buf: VecDeque<u8>,
    stopped: bool,
    closed: bool,
    /// Bumped on every stop so a reader that slept through a stop/start
    /// pair still observes the failure.
    generation: u64,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<PipeState>,
    readable: Condvar,
}

/// Create a connected pipe. Bytes written to the writer are read from the reader.
pub fn pipe() -> (PipeWriter, PipeReader) {
    let shared = Arc::new(Shared::default());
    (
        PipeWriter {
            shared: Arc::clone(&shared),
        },
        PipeReader {
            shared,
            read_timeout: None,
        },
    )
}

/// Writing end of a [`pipe`].
#[derive(Debug, Clone)]
pub struct PipeWriter {
    shared: Arc<Shared>,
}

/// Reading end of a [`pipe`].
#[derive(Debug)]
pub struct PipeReader {
    shared: Arc<Shared>,
    read_timeout: Option<Duration>,
}

/// Stop/start handle shared by both ends of a [`pipe`].
#[derive(Debug, Clone)]
pub struct PipeControl {
    shared: Arc<Shared>,
}

impl PipeWriter {
    pub fn control(&self) -> PipeControl {
        PipeControl {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl PipeReader {
    pub fn control(&self) -> PipeControl {
        PipeControl {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Bound how long a single `read` may block. `None` blocks indefinitely.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }

    /// Number of bytes buffered and not yet read.
    pub fn available(&self) -> usize {
        self.shared.state.lock().buf.len()
    }
}

impl PipeControl {
    /// Discard buffered bytes and fail pending and future I/O until restarted.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        let discarded = state.buf.len();
        state.buf.clear();
        state.stopped = true;
        state.generation = state.generation.wrapping_add(1);
        self.shared.readable.notify_all();
        debug!(discarded, "pipe stopped");
    }

    /// Re-enable a stopped pipe.
    pub fn start(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        state.stopped = false;
        debug!("pipe started");
        Ok(())
    }

    /// Close the pipe for good. Readers drain what is buffered, then see EOF.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        state.closed = true;
        self.shared.readable.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.state.lock().stopped
    }
}

impl Interrupt for PipeControl {
    fn interrupt(&self) {
        self.close();
    }
}

impl Read for PipeReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        let deadline = self.read_timeout.map(|timeout| Instant::now() + timeout);
        let mut state = self.shared.state.lock();
        let generation = state.generation;

        loop {
            if state.stopped || state.generation != generation {
                return Err(TransportError::Stopped.into_io());
            }
            if !state.buf.is_empty() {
                let n = out.len().min(state.buf.len());
                for (slot, byte) in out.iter_mut().zip(state.buf.drain(..n)) {
                    *slot = byte;
                }
                return Ok(n);
            }
            if state.closed {
                return Ok(0);
            }
            match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Err(io::Error::from(io::ErrorKind::TimedOut));
                    }
                    self.shared.readable.wait_until(&mut state, deadline);
                }
                None => self.shared.readable.wait(&mut state),
            }
        }
    }
}

impl InboundChannel for PipeReader {
    fn interrupter(&self) -> Option<Arc<dyn Interrupt>> {
        Some(Arc::new(self.control()))
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(TransportError::Closed.into_io());
        }
        if state.stopped {
            return Err(TransportError::Stopped.into_io());
        }
        state.buf.extend(buf);
        self.shared.readable.notify_all();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
