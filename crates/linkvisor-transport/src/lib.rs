//! Byte channels for supervised point-to-point links.
//!
//! A link handler borrows three channels: `inbound`, `outbound` and an
//! optional `unreliable-outbound` for heartbeat pings. This crate defines
//! that channel set ([`LinkChannels`]) together with two implementations:
//! - an in-process [`memory::pipe`] with driver-like stop/start semantics
//! - Unix domain sockets ([`UnixDomainSocket`], [`LinkStream`])

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use memory::{pipe, PipeControl, PipeReader, PipeWriter};
pub use traits::{InboundChannel, InboundStream, Interrupt, LinkChannels, LinkStream};

#[cfg(unix)]
pub use uds::UnixDomainSocket;
