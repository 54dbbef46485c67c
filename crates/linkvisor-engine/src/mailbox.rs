//! Reader-to-supervisor queue for non-data frame headers.

use std::time::Duration;

use crossbeam::channel::{self, select, Receiver, Sender, TrySendError};
use linkvisor_frame::Header;
use parking_lot::Mutex;

/// Outcome of a timed mailbox receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Message(Header),
    TimedOut,
    /// The mailbox was closed while waiting.
    Closed,
}

/// Bounded single-producer, single-consumer header queue.
///
/// The reader pushes with [`forward`](Self::forward), which never blocks.
/// The supervisor receives with a deadline. Closing the mailbox wakes a
/// supervisor blocked in [`recv_deadline`](Self::recv_deadline).
#[derive(Debug)]
pub struct Mailbox {
    tx: Sender<Header>,
    rx: Receiver<Header>,
    close_tx: Mutex<Option<Sender<()>>>,
    close_rx: Receiver<()>,
}

impl Mailbox {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity);
        let (close_tx, close_rx) = channel::bounded(0);
        Self {
            tx,
            rx,
            close_tx: Mutex::new(Some(close_tx)),
            close_rx,
        }
    }

    /// Queue a header. Returns `false` if the mailbox is full or closed.
    pub fn forward(&self, header: Header) -> bool {
        match self.tx.try_send(header) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Wait up to `timeout` for the next header.
    pub fn recv_deadline(&self, timeout: Duration) -> Poll {
        select! {
            recv(self.rx) -> msg => match msg {
                Ok(header) => Poll::Message(header),
                Err(_) => Poll::Closed,
            },
            recv(self.close_rx) -> _ => Poll::Closed,
            default(timeout) => Poll::TimedOut,
        }
    }

    /// Drop everything queued. Returns how many headers were discarded.
    pub fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }

    /// Wake any pending receive with [`Poll::Closed`]. Idempotent.
    pub fn close(&self) {
        self.close_tx.lock().take();
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
