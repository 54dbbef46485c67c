//! Link setup and the wait loop shared by `serve` and `connect`.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use linkvisor_engine::{CallbackResult, LinkConfig, LinkHandler, ManualReset, PayloadHandler};
use linkvisor_frame::{discard_payload, read_payload_limited, FrameError};
use linkvisor_transport::LinkStream;
use tracing::{info, warn};

use crate::exit::{link_error, transport_error, CliError, CliResult, INTERNAL, LINK_LOST, SUCCESS};
use crate::output::{print_payload, print_summary, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Why a command stopped supervising its link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Interrupted,
    LinkLost,
    Elapsed,
}

impl Outcome {
    fn reason(self) -> &'static str {
        match self {
            Outcome::Interrupted => "interrupted",
            Outcome::LinkLost => "link lost",
            Outcome::Elapsed => "duration elapsed",
        }
    }
}

/// Prints each payload and optionally echoes it back.
struct PrintPayloads {
    label: String,
    format: OutputFormat,
    echo: bool,
}

impl PayloadHandler for PrintPayloads {
    fn on_payload(
        &self,
        link: &LinkHandler,
        inbound: &mut dyn Read,
        size: u32,
    ) -> CallbackResult {
        let max = link.config().frame.max_payload_size;
        let payload = match read_payload_limited(inbound, size, max) {
            Ok(payload) => payload,
            Err(err @ FrameError::PayloadTooLarge { .. }) => {
                discard_payload(inbound, size)?;
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };
        print_payload(&payload, &self.label, self.format);
        if self.echo {
            link.write(&payload)?;
        }
        Ok(())
    }
}

/// Build a handler over a connected socket. Socket links cannot be
/// re-established in place, so a failed heartbeat leaves the link lost.
pub fn open(
    stream: LinkStream,
    config: LinkConfig,
    label: &str,
    format: OutputFormat,
    echo: bool,
) -> CliResult<LinkHandler> {
    let channels = stream
        .into_channels()
        .map_err(|err| transport_error("stream setup failed", err))?;
    let handler = LinkHandler::init(
        channels,
        config,
        PrintPayloads {
            label: label.to_string(),
            format,
            echo,
        },
        ManualReset,
    )
    .map_err(|err| link_error("link init failed", err))?;
    handler
        .start()
        .map_err(|err| link_error("link start failed", err))?;
    info!(link = label, "link supervised");
    Ok(handler)
}

pub fn install_ctrlc_handler() -> CliResult<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;
    Ok(running)
}

/// Check whether the command should stop now.
pub fn check(
    handler: &LinkHandler,
    running: &AtomicBool,
    until: Option<Instant>,
) -> Option<Outcome> {
    if !running.load(Ordering::SeqCst) {
        return Some(Outcome::Interrupted);
    }
    if handler.status().is_suspended() {
        return Some(Outcome::LinkLost);
    }
    match until {
        Some(until) if Instant::now() >= until => Some(Outcome::Elapsed),
        _ => None,
    }
}

/// Block until interrupted, the link is lost, or `until` passes.
pub fn wait(handler: &LinkHandler, running: &AtomicBool, until: Option<Instant>) -> Outcome {
    loop {
        if let Some(outcome) = check(handler, running, until) {
            return outcome;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Stop the handler, print its counters and pick the exit code.
pub fn finish(
    handler: LinkHandler,
    outcome: Outcome,
    label: &str,
    format: OutputFormat,
) -> CliResult<i32> {
    if let Err(err) = handler.stop() {
        warn!(error = %err, "link shutdown incomplete");
    }
    print_summary(&handler.stats(), label, outcome.reason(), format);

    match outcome {
        Outcome::LinkLost => Err(CliError::new(
            LINK_LOST,
            format!("{label}: peer stopped answering heartbeats"),
        )),
        Outcome::Interrupted | Outcome::Elapsed => Ok(SUCCESS),
    }
}
