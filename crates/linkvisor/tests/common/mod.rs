#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver};
use linkvisor::engine::{LinkConfig, LinkHandler, PayloadHandler, ResetStrategy};
use linkvisor::frame::{read_header, read_payload, ByteOrder, FrameError, FrameType, Header};
use linkvisor::transport::{pipe, LinkChannels, PipeControl, PipeReader, PipeWriter};

pub const WAIT: Duration = Duration::from_secs(5);

/// Short timings so failures surface within tens of milliseconds.
pub fn fast_config() -> LinkConfig {
    LinkConfig::default()
        .with_heartbeat_period(Duration::from_millis(20))
        .with_reply_deadline(Duration::from_millis(100))
}

pub fn wait_for(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return;
        }
        thread::sleep(Duration::from_millis(5));
    }
    panic!("timed out waiting for {what}");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameType,
    pub payload: Vec<u8>,
}

/// Both pipes of a link, created before the handler so reset strategies can
/// hold their controls.
pub struct Pipes {
    peer_tx: PipeWriter,
    inbound: PipeReader,
    outbound: PipeWriter,
    peer_rx: PipeReader,
}

impl Pipes {
    pub fn new() -> Self {
        let (peer_tx, inbound) = pipe();
        let (outbound, peer_rx) = pipe();
        Self {
            peer_tx,
            inbound,
            outbound,
            peer_rx,
        }
    }

    pub fn inbound_control(&self) -> PipeControl {
        self.inbound.control()
    }

    pub fn outbound_control(&self) -> PipeControl {
        self.outbound.control()
    }

    pub fn into_link(
        self,
        config: LinkConfig,
        payload: impl PayloadHandler,
        reset: impl ResetStrategy,
    ) -> (LinkHandler, Peer) {
        self.into_link_with(config, payload, reset, |channels| channels)
    }

    pub fn into_link_with(
        self,
        config: LinkConfig,
        payload: impl PayloadHandler,
        reset: impl ResetStrategy,
        adjust: impl FnOnce(LinkChannels) -> LinkChannels,
    ) -> (LinkHandler, Peer) {
        let order = config.frame.byte_order;
        let channels = adjust(LinkChannels::new(self.inbound, self.outbound));
        let handler = LinkHandler::init(channels, config, payload, reset).unwrap();
        let peer = Peer::spawn(self.peer_tx, self.peer_rx, order);
        (handler, peer)
    }
}

/// Scripted far end of a link. Records every frame the handler sends and,
/// while `answer` is on, replies to the handler's pings.
pub struct Peer {
    tx: PipeWriter,
    order: ByteOrder,
    frames: Receiver<Frame>,
    answering: Arc<AtomicBool>,
    control: PipeControl,
    thread: Option<JoinHandle<()>>,
}

impl Peer {
    fn spawn(tx: PipeWriter, mut rx: PipeReader, order: ByteOrder) -> Self {
        let (frames_tx, frames) = channel::unbounded();
        let answering = Arc::new(AtomicBool::new(false));
        let control = rx.control();

        let thread = {
            let mut tx = tx.clone();
            let answering = Arc::clone(&answering);
            thread::spawn(move || loop {
                let header = match read_header(&mut rx, order) {
                    Ok(header) => header,
                    Err(FrameError::ConnectionClosed) => break,
                    Err(_) => {
                        thread::sleep(Duration::from_millis(2));
                        continue;
                    }
                };
                let payload = match header.kind {
                    FrameType::Payload => match read_payload(&mut rx, header.size) {
                        Ok(payload) => payload.to_vec(),
                        Err(_) => continue,
                    },
                    _ => Vec::new(),
                };
                if header.kind == FrameType::Ping && answering.load(Ordering::SeqCst) {
                    let _ = tx.write_all(&Header::pong().encode(order));
                }
                let frame = Frame {
                    kind: header.kind,
                    payload,
                };
                if frames_tx.send(frame).is_err() {
                    break;
                }
            })
        };

        Self {
            tx,
            order,
            frames,
            answering,
            control,
            thread: Some(thread),
        }
    }

    pub fn answer(&self, on: bool) {
        self.answering.store(on, Ordering::SeqCst);
    }

    pub fn send(&self, header: Header) {
        self.send_raw(&header.encode(self.order));
    }

    pub fn send_payload(&self, payload: &[u8]) {
        let mut frame = Header::payload(payload.len() as u32)
            .encode(self.order)
            .to_vec();
        frame.extend_from_slice(payload);
        self.send_raw(&frame);
    }

    pub fn send_raw(&self, bytes: &[u8]) {
        let mut tx = self.tx.clone();
        tx.write_all(bytes).unwrap();
    }

    /// Next frame of `kind`, skipping everything else.
    pub fn expect(&self, kind: FrameType) -> Frame {
        let deadline = Instant::now() + WAIT;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.frames.recv_timeout(remaining) {
                Ok(frame) if frame.kind == kind => return frame,
                Ok(_) => continue,
                Err(_) => panic!("no {kind:?} frame within {WAIT:?}"),
            }
        }
    }

    /// Everything received within `period`.
    pub fn collect_for(&self, period: Duration) -> Vec<Frame> {
        let deadline = Instant::now() + period;
        let mut frames = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.frames.recv_timeout(remaining) {
                Ok(frame) => frames.push(frame),
                Err(_) => return frames,
            }
        }
    }

    pub fn drain(&self) -> Vec<Frame> {
        self.frames.try_iter().collect()
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        let _ = self.control.start();
        self.control.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

pub fn count(frames: &[Frame], kind: FrameType) -> usize {
    frames.iter().filter(|frame| frame.kind == kind).count()
}
