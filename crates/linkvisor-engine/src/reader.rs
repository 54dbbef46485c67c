//! Reader engine: demultiplexes inbound frames.
//!
//! PAYLOAD goes to the application handler, PING is answered inline with a
//! PONG on the reliable outbound channel, everything else is forwarded to
//! the supervisor mailbox. A failed header read suspends the engine until
//! the next start.

use linkvisor_frame::{FrameReader, FrameType, Header};
use linkvisor_transport::InboundChannel;
use tracing::{debug, info, trace, warn};

use crate::error::LinkError;
use crate::handler::LinkHandler;
use crate::signal::Wake;
use crate::stats::bump;

pub(crate) fn run(link: LinkHandler) {
    let shared = &link.shared;
    let Some(inbound) = shared.inbound.lock().take() else {
        warn!(engine = "reader", "inbound channel already claimed; reader exiting");
        return;
    };
    let mut reader = FrameReader::with_config(inbound, shared.config.frame.clone());
    info!(engine = "reader", "reader engine running");

    loop {
        if shared.is_stopped() {
            break;
        }
        match reader.read_header() {
            Ok(header) => dispatch(&link, &mut reader, header),
            Err(err) => {
                if shared.is_stopped() {
                    break;
                }
                let err = LinkError::TransportRead(err);
                warn!(engine = "reader", error = %err, "inbound channel failed; suspending");
                match shared.reader.suspend() {
                    Wake::Resumed => info!(engine = "reader", "reader engine resumed"),
                    Wake::Shutdown => break,
                }
            }
        }
    }

    debug!(engine = "reader", "reader engine exiting");
}

fn dispatch(
    link: &LinkHandler,
    reader: &mut FrameReader<Box<dyn InboundChannel>>,
    header: Header,
) {
    let shared = &link.shared;
    match header.kind {
        FrameType::Payload => {
            bump(&shared.counters.payloads_received);
            trace!(engine = "reader", size = header.size, "payload frame");
            if let Err(err) = shared.payload.on_payload(link, reader.get_mut(), header.size) {
                bump(&shared.counters.payload_errors);
                warn!(
                    engine = "reader",
                    size = header.size,
                    error = %err,
                    "payload handler failed"
                );
            }
        }
        FrameType::Ping => match shared.outbound.send_control(FrameType::Pong) {
            Ok(()) => {
                bump(&shared.counters.pongs_sent);
                trace!(engine = "reader", "answered ping");
            }
            Err(err) => {
                let err = LinkError::TransportWrite(err);
                warn!(engine = "reader", error = %err, "failed to answer ping");
            }
        },
        kind => {
            if !shared.mailbox.forward(header) {
                bump(&shared.counters.mailbox_dropped);
                warn!(
                    engine = "reader",
                    frame_type = kind.code(),
                    "supervisor mailbox full; header dropped"
                );
            }
        }
    }
}
