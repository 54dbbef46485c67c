use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use linkvisor_frame::FrameWriter;
use linkvisor_transport::{InboundChannel, Interrupt, LinkChannels};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::callbacks::{PayloadHandler, ResetStrategy};
use crate::config::LinkConfig;
use crate::engine::{join, Engine, EngineStatus};
use crate::error::{LinkError, Result};
use crate::mailbox::Mailbox;
use crate::stats::{bump, LinkCounters, LinkStats};
use crate::{reader, supervisor};

pub(crate) type Outbound = FrameWriter<Box<dyn Write + Send>>;

/// Status of both engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkStatus {
    pub reader: EngineStatus,
    pub supervisor: EngineStatus,
}

impl LinkStatus {
    /// Both engines are up and not waiting on a resume token.
    pub fn is_running(&self) -> bool {
        self.reader == EngineStatus::Running && self.supervisor == EngineStatus::Running
    }

    /// The supervisor is parked after a reset and the link is not supervised.
    pub fn is_suspended(&self) -> bool {
        self.supervisor == EngineStatus::Suspended
    }
}

pub(crate) struct Shared {
    pub config: LinkConfig,
    pub outbound: Outbound,
    pub unreliable: Outbound,
    pub inbound: Mutex<Option<Box<dyn InboundChannel>>>,
    pub interrupter: Option<Arc<dyn Interrupt>>,
    pub payload: Box<dyn PayloadHandler>,
    pub reset: Box<dyn ResetStrategy>,
    pub mailbox: Mailbox,
    pub reader: Engine,
    pub supervisor: Engine,
    pub counters: LinkCounters,
    stopped: AtomicBool,
}

impl Shared {
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Supervises one point-to-point link.
///
/// Owns two engine threads sharing the borrowed transport channels:
/// - the reader demultiplexes inbound frames and answers pings
/// - the supervisor sends heartbeats and runs the reset protocol on failure
///
/// The handle is cheap to clone; clones refer to the same link. Threads are
/// created lazily by the first [`start`](Self::start).
#[derive(Clone)]
pub struct LinkHandler {
    pub(crate) shared: Arc<Shared>,
}

impl LinkHandler {
    /// Bind the handler to its channels and callbacks. No threads are spawned.
    pub fn init(
        channels: LinkChannels,
        config: LinkConfig,
        payload: impl PayloadHandler,
        reset: impl ResetStrategy,
    ) -> Result<Self> {
        config.validate()?;

        let LinkChannels {
            inbound,
            outbound,
            unreliable_outbound,
        } = channels;

        let outbound: Outbound = FrameWriter::with_config(outbound, config.frame.clone());
        let unreliable = match unreliable_outbound {
            Some(channel) => FrameWriter::with_config(channel, config.frame.clone()),
            None => outbound.clone(),
        };
        let interrupter = inbound.interrupter();
        if interrupter.is_none() {
            debug!("inbound channel has no interrupter; stop will detach the reader");
        }

        info!(
            heartbeat = ?config.heartbeat_period,
            deadline = ?config.reply_deadline,
            byte_order = ?config.frame.byte_order,
            "link handler initialised"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                mailbox: Mailbox::new(config.mailbox_capacity),
                reader: Engine::new("reader", config.reader.clone()),
                supervisor: Engine::new("supervisor", config.supervisor.clone()),
                config,
                outbound,
                unreliable,
                inbound: Mutex::new(Some(inbound)),
                interrupter,
                payload: Box::new(payload),
                reset: Box::new(reset),
                counters: LinkCounters::default(),
                stopped: AtomicBool::new(false),
            }),
        })
    }

    /// Start the link, or resume it after a reset.
    ///
    /// The first call spawns the supervisor and then the reader. Later calls
    /// post one resume token to each engine. A token posted to an engine
    /// that is not suspended stays pending and is consumed by its next
    /// suspension.
    pub fn start(&self) -> Result<()> {
        if self.shared.is_stopped() {
            return Err(LinkError::Stopped);
        }

        let link = self.clone();
        self.shared.supervisor.start(move || supervisor::run(link))?;
        let link = self.clone();
        self.shared.reader.start(move || reader::run(link))?;
        Ok(())
    }

    /// Shut the link down for good.
    ///
    /// Wakes both engines, interrupts blocked channel I/O when the inbound
    /// channel supports it, and joins both threads. When called from an engine thread
    /// (for instance inside a callback) that thread is not joined. Without an
    /// interrupter the reader thread is detached and exits on its next read.
    pub fn stop(&self) -> Result<()> {
        if self.shared.stopped.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("stopping link handler");

        let shared = &self.shared;
        shared.mailbox.close();
        let supervisor = shared.supervisor.shutdown();
        let reader = shared.reader.shutdown();

        if let Some(interrupter) = &shared.interrupter {
            interrupter.interrupt();
        }

        let mut outcome = Ok(());
        if let Some(handle) = supervisor {
            outcome = join(shared.supervisor.label(), handle);
        }
        if let Some(handle) = reader {
            if shared.interrupter.is_some() {
                outcome = outcome.and(join(shared.reader.label(), handle));
            } else {
                warn!("inbound channel is not interruptible; reader thread detached");
            }
        }

        debug!("link handler stopped");
        outcome
    }

    /// Send one PAYLOAD frame on the reliable outbound channel.
    ///
    /// Safe to call from any thread, including payload handlers. Frames are
    /// never interleaved with PONGs or other writes. Returns the number of
    /// payload bytes sent.
    pub fn write(&self, payload: &[u8]) -> Result<usize> {
        if self.shared.is_stopped() {
            return Err(LinkError::Stopped);
        }
        let written = self
            .shared
            .outbound
            .send_payload(payload)
            .map_err(LinkError::TransportWrite)?;
        bump(&self.shared.counters.payloads_sent);
        Ok(written)
    }

    pub fn status(&self) -> LinkStatus {
        LinkStatus {
            reader: self.shared.reader.status(),
            supervisor: self.shared.supervisor.status(),
        }
    }

    pub fn stats(&self) -> LinkStats {
        self.shared.counters.snapshot()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.shared.config
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }
}

impl std::fmt::Debug for LinkHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkHandler")
            .field("status", &self.status())
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::thread;
    use std::time::Duration;

    use linkvisor_frame::{read_header, read_payload, ByteOrder, FrameType, Header};
    use linkvisor_transport::{pipe, InboundStream, PipeReader, PipeWriter};

    use super::*;
    use crate::callbacks::{payload_fn, reset_fn, DiscardPayload, ManualReset};

    fn fast_config() -> LinkConfig {
        LinkConfig::default()
            .with_heartbeat_period(Duration::from_millis(20))
            .with_reply_deadline(Duration::from_millis(50))
    }

    /// Handler on one side of two pipes; returns the peer's ends.
    fn link(config: LinkConfig) -> (LinkHandler, PipeWriter, PipeReader) {
        let (peer_tx, inbound) = pipe();
        let (outbound, peer_rx) = pipe();
        let handler = LinkHandler::init(
            LinkChannels::new(inbound, outbound),
            config,
            DiscardPayload,
            ManualReset,
        )
        .unwrap();
        (handler, peer_tx, peer_rx)
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        for _ in 0..400 {
            if condition() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("condition not reached");
    }

    #[test]
    fn init_rejects_bad_config() {
        let (_peer_tx, inbound) = pipe();
        let (outbound, _peer_rx) = pipe();
        let err = LinkHandler::init(
            LinkChannels::new(inbound, outbound),
            LinkConfig::default().with_mailbox_capacity(0),
            DiscardPayload,
            ManualReset,
        )
        .unwrap_err();
        assert!(matches!(err, LinkError::Config(_)));
    }

    #[test]
    fn init_spawns_nothing() {
        let (handler, _peer_tx, _peer_rx) = link(fast_config());
        assert_eq!(
            handler.status(),
            LinkStatus {
                reader: EngineStatus::NeverStarted,
                supervisor: EngineStatus::NeverStarted,
            }
        );
        handler.stop().unwrap();
    }

    #[test]
    fn write_frames_payload() {
        let (handler, _peer_tx, mut peer_rx) = link(fast_config());
        assert_eq!(handler.write(&[9, 0, 0, 0]).unwrap(), 4);

        let header = read_header(&mut peer_rx, ByteOrder::Little).unwrap();
        assert_eq!(header, Header::payload(4));
        assert_eq!(read_payload(&mut peer_rx, 4).unwrap().as_ref(), &[9, 0, 0, 0]);
        assert_eq!(handler.stats().payloads_sent, 1);
        handler.stop().unwrap();
    }

    #[test]
    fn write_failure_is_reported() {
        let (handler, _peer_tx, peer_rx) = link(fast_config());
        peer_rx.control().close();
        assert!(matches!(
            handler.write(b"x").unwrap_err(),
            LinkError::TransportWrite(_)
        ));
        handler.stop().unwrap();
    }

    #[test]
    fn write_and_start_after_stop_fail() {
        let (handler, _peer_tx, _peer_rx) = link(fast_config());
        handler.stop().unwrap();
        handler.stop().unwrap();
        assert!(matches!(handler.start(), Err(LinkError::Stopped)));
        assert!(matches!(handler.write(b"x"), Err(LinkError::Stopped)));
        assert_eq!(handler.status().reader, EngineStatus::Stopped);
    }

    #[test]
    fn started_link_answers_pings_and_stops_cleanly() {
        let (handler, mut peer_tx, mut peer_rx) = link(fast_config());
        handler.start().unwrap();

        peer_tx.write_all(&Header::ping().encode(ByteOrder::Little)).unwrap();

        // The supervisor pings too; skip those until our PONG shows up.
        loop {
            let header = read_header(&mut peer_rx, ByteOrder::Little).unwrap();
            if header.kind == FrameType::Pong {
                break;
            }
        }
        wait_for(|| handler.stats().pongs_sent == 1);
        handler.stop().unwrap();
        assert_eq!(handler.status().supervisor, EngineStatus::Stopped);
    }

    #[test]
    fn payload_handler_can_write_back() {
        let (peer_tx, inbound) = pipe();
        let (outbound, mut peer_rx) = pipe();
        let handler = LinkHandler::init(
            LinkChannels::new(inbound, outbound),
            fast_config().with_heartbeat_period(Duration::from_secs(60)),
            payload_fn(|link: &LinkHandler, inbound: &mut dyn Read, size: u32| {
                let payload = read_payload(inbound, size)?;
                link.write(&payload)?;
                Ok(())
            }),
            ManualReset,
        )
        .unwrap();
        handler.start().unwrap();

        let mut peer_tx = peer_tx;
        let mut frame = Header::payload(4).encode(ByteOrder::Little).to_vec();
        frame.extend_from_slice(b"echo");
        peer_tx.write_all(&frame).unwrap();

        let mut echoed = None;
        while echoed.is_none() {
            let header = read_header(&mut peer_rx, ByteOrder::Little).unwrap();
            if header.kind == FrameType::Payload {
                echoed = Some(read_payload(&mut peer_rx, header.size).unwrap());
            }
        }
        assert_eq!(echoed.unwrap().as_ref(), b"echo");
        handler.stop().unwrap();
    }

    #[test]
    fn stop_from_reset_strategy_does_not_deadlock() {
        let (_peer_tx, inbound) = pipe();
        let (outbound, _peer_rx) = pipe();
        let handler = LinkHandler::init(
            LinkChannels::new(inbound, outbound),
            fast_config(),
            DiscardPayload,
            reset_fn(|link: &LinkHandler| {
                link.stop()?;
                Ok(())
            }),
        )
        .unwrap();
        handler.start().unwrap();

        wait_for(|| handler.is_stopped());
        wait_for(|| handler.status().supervisor == EngineStatus::Stopped);
        handler.stop().unwrap();
    }

    #[test]
    fn uninterruptible_inbound_detaches_reader() {
        let (_peer_tx, inbound) = pipe();
        let (outbound, _peer_rx) = pipe();
        let handler = LinkHandler::init(
            LinkChannels::new(InboundStream(inbound), outbound),
            fast_config(),
            DiscardPayload,
            ManualReset,
        )
        .unwrap();
        handler.start().unwrap();
        handler.stop().unwrap();
        assert_eq!(handler.status().reader, EngineStatus::Stopped);
    }
}
