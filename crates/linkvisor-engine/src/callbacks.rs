//! Application hooks invoked by the engine threads.
//!
//! Both hooks receive the [`LinkHandler`] they belong to, so they can call
//! back into it: a reset strategy typically restarts the transport channels,
//! a payload handler may answer with [`LinkHandler::write`].

use std::io::Read;

use linkvisor_frame::discard_payload;
use linkvisor_transport::PipeControl;
use tracing::debug;

use crate::handler::LinkHandler;

/// Error type returned by application hooks.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

pub type CallbackResult = Result<(), CallbackError>;

/// Consumes PAYLOAD frames on the reader thread.
///
/// Called right after the header has been read. The handler must consume
/// exactly `size` bytes from `inbound` before returning, or the reader loses
/// framing alignment.
pub trait PayloadHandler: Send + Sync + 'static {
    fn on_payload(&self, link: &LinkHandler, inbound: &mut dyn Read, size: u32)
        -> CallbackResult;
}

/// Attempts to restore the transport after a heartbeat failure.
///
/// Runs on the supervisor thread. `Ok(())` makes the handler resume both
/// engines; an error leaves them suspended until [`LinkHandler::start`] is
/// called from outside.
pub trait ResetStrategy: Send + Sync + 'static {
    fn reset(&self, link: &LinkHandler) -> CallbackResult;
}

/// Wrap a closure as a [`PayloadHandler`].
pub fn payload_fn<F>(f: F) -> PayloadFn<F>
where
    F: Fn(&LinkHandler, &mut dyn Read, u32) -> CallbackResult + Send + Sync + 'static,
{
    PayloadFn(f)
}

/// Wrap a closure as a [`ResetStrategy`].
pub fn reset_fn<F>(f: F) -> ResetFn<F>
where
    F: Fn(&LinkHandler) -> CallbackResult + Send + Sync + 'static,
{
    ResetFn(f)
}

/// See [`payload_fn`].
pub struct PayloadFn<F>(F);

impl<F> PayloadHandler for PayloadFn<F>
where
    F: Fn(&LinkHandler, &mut dyn Read, u32) -> CallbackResult + Send + Sync + 'static,
{
    fn on_payload(
        &self,
        link: &LinkHandler,
        inbound: &mut dyn Read,
        size: u32,
    ) -> CallbackResult {
        (self.0)(link, inbound, size)
    }
}

/// See [`reset_fn`].
pub struct ResetFn<F>(F);

impl<F> ResetStrategy for ResetFn<F>
where
    F: Fn(&LinkHandler) -> CallbackResult + Send + Sync + 'static,
{
    fn reset(&self, link: &LinkHandler) -> CallbackResult {
        (self.0)(link)
    }
}

/// Skips every payload, keeping the stream aligned.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardPayload;

impl PayloadHandler for DiscardPayload {
    fn on_payload(&self, _link: &LinkHandler, inbound: &mut dyn Read, size: u32) -> CallbackResult {
        discard_payload(inbound, size)?;
        debug!(size, "payload discarded");
        Ok(())
    }
}

/// Reports failure without touching the transport. The link stays suspended
/// until restarted from outside.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualReset;

impl ResetStrategy for ManualReset {
    fn reset(&self, _link: &LinkHandler) -> CallbackResult {
        Err("transport reset left to the application".into())
    }
}

/// Pulses a set of in-memory pipes: stop all, then start all.
///
/// Stopping discards whatever the pipes buffered, so stale frames from
/// before the failure never reach the restarted engines.
#[derive(Debug, Clone, Default)]
pub struct RestartPipes {
    controls: Vec<PipeControl>,
}

impl RestartPipes {
    pub fn new(controls: impl IntoIterator<Item = PipeControl>) -> Self {
        Self {
            controls: controls.into_iter().collect(),
        }
    }
}

impl ResetStrategy for RestartPipes {
    fn reset(&self, _link: &LinkHandler) -> CallbackResult {
        for control in &self.controls {
            control.stop();
        }
        for control in &self.controls {
            control.start()?;
        }
        debug!(pipes = self.controls.len(), "pipes restarted");
        Ok(())
    }
}
