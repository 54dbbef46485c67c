//! Supervised point-to-point links.
//!
//! A [`LinkHandler`] runs two threads over a borrowed set of transport
//! channels. The reader engine dispatches inbound frames and answers the
//! peer's pings. The supervisor engine pings the peer periodically and,
//! when a reply is missing or wrong, asks the application to reset the
//! transport before resuming both engines.

pub mod callbacks;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod mailbox;
pub mod signal;
pub mod stats;

mod reader;
mod supervisor;

pub use callbacks::{
    payload_fn, reset_fn, CallbackError, CallbackResult, DiscardPayload, ManualReset,
    PayloadHandler, ResetStrategy, RestartPipes,
};
pub use config::{
    EngineConfig, LinkConfig, DEFAULT_HEARTBEAT_PERIOD, DEFAULT_MAILBOX_CAPACITY,
    DEFAULT_REPLY_DEADLINE,
};
pub use engine::EngineStatus;
pub use error::{LinkError, Result};
pub use handler::{LinkHandler, LinkStatus};
pub use stats::LinkStats;
