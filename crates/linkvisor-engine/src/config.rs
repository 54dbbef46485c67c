use std::time::Duration;

use linkvisor_frame::{ByteOrder, FrameConfig};

use crate::error::{LinkError, Result};

/// Interval between heartbeat cycles.
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_secs(1);

/// How long the supervisor waits for a PONG after each PING.
pub const DEFAULT_REPLY_DEADLINE: Duration = Duration::from_secs(1);

/// Capacity of the reader-to-supervisor mailbox.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 16;

/// Thread parameters for one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Thread name, also used as the `engine` field in logs.
    pub name: String,
    /// Explicit stack size. `None` uses the platform default.
    pub stack_size: Option<usize>,
    /// Scheduling hint. Recorded and logged; OS threads are not re-prioritised.
    pub priority: Option<i32>,
}

impl EngineConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stack_size: None,
            priority: None,
        }
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Configuration for a [`LinkHandler`](crate::LinkHandler).
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Sleep between heartbeat cycles. Default: 1 s.
    pub heartbeat_period: Duration,
    /// Deadline for the PONG after a PING. Default: 1 s.
    pub reply_deadline: Duration,
    /// Mailbox capacity. Headers beyond it are dropped. Default: 16.
    pub mailbox_capacity: usize,
    /// Header encoding shared with the peer.
    pub frame: FrameConfig,
    pub reader: EngineConfig,
    pub supervisor: EngineConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            heartbeat_period: DEFAULT_HEARTBEAT_PERIOD,
            reply_deadline: DEFAULT_REPLY_DEADLINE,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            frame: FrameConfig::default(),
            reader: EngineConfig::named("link-reader"),
            supervisor: EngineConfig::named("link-supervisor"),
        }
    }
}

impl LinkConfig {
    pub fn with_heartbeat_period(mut self, period: Duration) -> Self {
        self.heartbeat_period = period;
        self
    }

    pub fn with_reply_deadline(mut self, deadline: Duration) -> Self {
        self.reply_deadline = deadline;
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.frame.byte_order = byte_order;
        self
    }

    pub fn with_mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity;
        self
    }

    /// Largest payload size payload handlers accept from the peer.
    pub fn with_max_payload_size(mut self, bytes: usize) -> Self {
        self.frame.max_payload_size = bytes;
        self
    }

    /// Reject settings the engines cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_period.is_zero() {
            return Err(LinkError::Config("heartbeat period must be non-zero".into()));
        }
        if self.reply_deadline.is_zero() {
            return Err(LinkError::Config("reply deadline must be non-zero".into()));
        }
        if self.mailbox_capacity == 0 {
            return Err(LinkError::Config("mailbox capacity must be non-zero".into()));
        }
        if self.frame.max_payload_size == 0 {
            return Err(LinkError::Config("max payload size must be non-zero".into()));
        }
        for engine in [&self.reader, &self.supervisor] {
            if engine.name.is_empty() {
                return Err(LinkError::Config("engine name must not be empty".into()));
            }
            if engine.stack_size == Some(0) {
                return Err(LinkError::Config(format!(
                    "{}: stack size must be non-zero",
                    engine.name
                )));
            }
        }
        Ok(())
    }
}
