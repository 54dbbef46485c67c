use std::io::{Read, Write};
use std::net::Shutdown;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Unblocks I/O pending on a link's channels.
///
/// Used by the link handler on shutdown so its threads can observe the stop
/// request instead of sleeping inside `read` or `write` forever.
pub trait Interrupt: Send + Sync {
    fn interrupt(&self);
}

/// The byte stream a link reads frames from.
pub trait InboundChannel: Read + Send {
    /// Handle that unblocks pending I/O, if the channel supports it.
    fn interrupter(&self) -> Option<Arc<dyn Interrupt>> {
        None
    }
}

/// Adapter turning any blocking `Read` into an [`InboundChannel`] without
/// interrupt support (serial drivers, files, cursors).
#[derive(Debug)]
pub struct InboundStream<R>(pub R);

impl<R: Read> Read for InboundStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl<R: Read + Send> InboundChannel for InboundStream<R> {}

/// The three transport channels a link handler borrows.
///
/// `unreliable_outbound` carries heartbeat pings only. When it is `None` the
/// pings share `outbound` (and its frame lock).
pub struct LinkChannels {
    pub inbound: Box<dyn InboundChannel>,
    pub outbound: Box<dyn Write + Send>,
    pub unreliable_outbound: Option<Box<dyn Write + Send>>,
}

impl LinkChannels {
    /// Channels where pings travel on `outbound`.
    pub fn new(
        inbound: impl InboundChannel + 'static,
        outbound: impl Write + Send + 'static,
    ) -> Self {
        Self {
            inbound: Box::new(inbound),
            outbound: Box::new(outbound),
            unreliable_outbound: None,
        }
    }

    /// Route heartbeat pings through a separate channel.
    pub fn with_unreliable_outbound(mut self, channel: impl Write + Send + 'static) -> Self {
        self.unreliable_outbound = Some(Box::new(channel));
        self
    }
}

impl std::fmt::Debug for LinkChannels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkChannels")
            .field("unreliable_outbound", &self.unreliable_outbound.is_some())
            .finish_non_exhaustive()
    }
}

/// A connected socket stream usable as link channels.
pub struct LinkStream {
    inner: LinkStreamInner,
}

enum LinkStreamInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for LinkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for LinkStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl LinkStream {
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: LinkStreamInner::Unix(stream),
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => Ok(Self::from_unix(stream.try_clone()?)),
        }
    }

    /// Shut down one or both halves of the stream.
    pub fn shutdown(&self, how: Shutdown) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(stream) => stream.shutdown(how).map_err(Into::into),
        }
    }

    /// Split into link channels: a cloned descriptor reads, this one writes.
    pub fn into_channels(self) -> Result<LinkChannels> {
        let inbound = self.try_clone()?;
        Ok(LinkChannels::new(inbound, self))
    }
}

impl InboundChannel for LinkStream {
    fn interrupter(&self) -> Option<Arc<dyn Interrupt>> {
        match self.try_clone() {
            Ok(stream) => Some(Arc::new(StreamInterrupt(stream))),
            Err(err) => {
                tracing::debug!(error = %err, "stream clone failed; reads are not interruptible");
                None
            }
        }
    }
}

/// Shuts down both directions: a socket split by [`LinkStream::into_channels`]
/// may have a writer blocked on a peer that stopped reading.
struct StreamInterrupt(LinkStream);

impl Interrupt for StreamInterrupt {
    fn interrupt(&self) {
        if let Err(err) = self.0.shutdown(Shutdown::Both) {
            tracing::debug!(error = %err, "stream shutdown failed");
        }
    }
}

impl std::fmt::Debug for LinkStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            #[cfg(unix)]
            LinkStreamInner::Unix(_) => f
                .debug_struct("LinkStream")
                .field("type", &"unix")
                .finish(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::Cursor;
    use std::os::unix::net::UnixStream;

    use super::*;

    #[test]
    fn interrupt_unblocks_pending_read() {
        let (left, _right) = UnixStream::pair().unwrap();
        let mut stream = LinkStream::from_unix(left);
        let interrupter = stream.interrupter().expect("unix streams are interruptible");

        let reader = std::thread::spawn(move || {
            let mut buf = [0u8; 8];
            stream.read(&mut buf)
        });

        std::thread::sleep(Duration::from_millis(20));
        interrupter.interrupt();

        let read = reader.join().unwrap().unwrap();
        assert_eq!(read, 0);
    }

    #[test]
    fn interrupt_unblocks_pending_write() {
        let (left, _right) = UnixStream::pair().unwrap();
        let mut stream = LinkStream::from_unix(left);
        let interrupter = stream.interrupter().expect("unix streams are interruptible");

        // Nobody reads `_right`, so this blocks once the socket buffer fills.
        let writer = std::thread::spawn(move || {
            let chunk = [0u8; 4096];
            loop {
                if let Err(err) = stream.write_all(&chunk) {
                    return err;
                }
            }
        });

        std::thread::sleep(Duration::from_millis(50));
        interrupter.interrupt();

        let err = writer.join().unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn into_channels_shares_one_socket() {
        let (left, right) = UnixStream::pair().unwrap();
        let channels = LinkStream::from_unix(left).into_channels().unwrap();
        let LinkChannels {
            mut inbound,
            mut outbound,
            unreliable_outbound,
        } = channels;
        assert!(unreliable_outbound.is_none());

        let mut peer = LinkStream::from_unix(right);
        outbound.write_all(b"out").unwrap();
        let mut buf = [0u8; 3];
        peer.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"out");

        peer.write_all(b"in!").unwrap();
        inbound.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"in!");
    }

    #[test]
    fn inbound_stream_has_no_interrupter() {
        let inbound = InboundStream(Cursor::new(vec![1u8, 2, 3]));
        assert!(inbound.interrupter().is_none());
    }

    #[test]
    fn separate_unreliable_channel_is_recorded() {
        let channels = LinkChannels::new(InboundStream(Cursor::new(Vec::new())), Vec::new())
            .with_unreliable_outbound(Vec::new());
        assert!(channels.unreliable_outbound.is_some());
        assert!(format!("{channels:?}").contains("unreliable_outbound: true"));
    }
}
