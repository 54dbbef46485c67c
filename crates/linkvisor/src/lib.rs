//! Heartbeat-supervised point-to-point links.
//!
//! linkvisor keeps a byte link to a peer healthy: it frames traffic with a
//! fixed 8-byte header, answers the peer's pings, pings the peer in turn,
//! and hands transport recovery to the application when replies stop.
//!
//! # Crate Structure
//!
//! - [`transport`]: channel abstraction, in-memory pipes, Unix sockets
//! - [`frame`]: header codec, header reader, atomic frame writer
//! - [`engine`]: reader and supervisor engines behind [`engine::LinkHandler`]

/// Re-export transport types.
pub mod transport {
    pub use linkvisor_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use linkvisor_frame::*;
}

/// Re-export engine types.
pub mod engine {
    pub use linkvisor_engine::*;
}

pub use linkvisor_engine::{LinkConfig, LinkError, LinkHandler};
pub use linkvisor_transport::LinkChannels;
