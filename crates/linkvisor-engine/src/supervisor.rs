//! Supervisor engine: heartbeat cycle and reset protocol.
//!
//! Every cycle sends one PING on the unreliable outbound channel and waits
//! for a PONG in the mailbox. A write failure, a timeout or any other header
//! in the mailbox triggers the reset protocol:
//!
//! 1. call the reset strategy
//! 2. on success, start the handler again (posts a resume token to both engines)
//! 3. suspend until resumed
//!
//! A successful reset therefore resumes the supervisor immediately with its
//! own token. A failed one leaves both engines suspended until an external
//! `start`.

use linkvisor_frame::FrameType;
use tracing::{debug, info, trace, warn};

use crate::error::{LinkError, Result};
use crate::handler::{LinkHandler, Shared};
use crate::mailbox::Poll;
use crate::signal::Wake;
use crate::stats::bump;

pub(crate) fn run(link: LinkHandler) {
    let shared = &link.shared;
    info!(
        engine = "supervisor",
        period = ?shared.config.heartbeat_period,
        deadline = ?shared.config.reply_deadline,
        "supervisor engine running"
    );

    loop {
        match heartbeat(shared) {
            Ok(()) => {}
            Err(LinkError::Stopped) => break,
            // Writes unblocked by stop fail; that is not a link failure.
            Err(_) if shared.is_stopped() => break,
            Err(failure) => {
                if reset(&link, &failure) == Wake::Shutdown {
                    break;
                }
            }
        }
        if shared.supervisor.sleep(shared.config.heartbeat_period) == Wake::Shutdown {
            break;
        }
    }

    debug!(engine = "supervisor", "supervisor engine exiting");
}

/// One PING/PONG exchange.
pub(crate) fn heartbeat(shared: &Shared) -> Result<()> {
    shared
        .unreliable
        .send_control(FrameType::Ping)
        .map_err(LinkError::TransportWrite)?;
    bump(&shared.counters.pings_sent);

    match shared.mailbox.recv_deadline(shared.config.reply_deadline) {
        Poll::Message(header) if header.kind == FrameType::Pong => {
            bump(&shared.counters.pongs_received);
            trace!(engine = "supervisor", "heartbeat acknowledged");
            Ok(())
        }
        Poll::Message(header) => Err(LinkError::Protocol { got: header.kind }),
        Poll::TimedOut => Err(LinkError::Timeout(shared.config.reply_deadline)),
        Poll::Closed => Err(LinkError::Stopped),
    }
}

fn reset(link: &LinkHandler, failure: &LinkError) -> Wake {
    let shared = &link.shared;
    bump(&shared.counters.resets);
    warn!(engine = "supervisor", error = %failure, "heartbeat failed; resetting transport");

    match shared.reset.reset(link) {
        Ok(()) => {
            info!(engine = "supervisor", "transport reset succeeded; restarting link");
            if let Err(err) = link.start() {
                warn!(engine = "supervisor", error = %err, "restart after reset failed");
            }
        }
        Err(err) => {
            bump(&shared.counters.reset_failures);
            let err = LinkError::ResetFailure(err.to_string());
            warn!(
                engine = "supervisor",
                error = %err,
                "link suspended until started again"
            );
        }
    }

    let wake = shared.supervisor.suspend();
    if wake == Wake::Resumed {
        let stale = shared.mailbox.drain();
        if stale > 0 {
            debug!(engine = "supervisor", stale, "discarded stale mailbox headers");
        }
        info!(engine = "supervisor", "supervisor engine resumed");
    }
    wake
}
