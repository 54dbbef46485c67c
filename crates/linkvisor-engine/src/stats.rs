use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Point-in-time copy of the link counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub pings_sent: u64,
    pub pongs_received: u64,
    pub pongs_sent: u64,
    pub payloads_received: u64,
    pub payloads_sent: u64,
    pub payload_errors: u64,
    pub mailbox_dropped: u64,
    pub resets: u64,
    pub reset_failures: u64,
}

#[derive(Debug, Default)]
pub(crate) struct LinkCounters {
    pub pings_sent: AtomicU64,
    pub pongs_received: AtomicU64,
    pub pongs_sent: AtomicU64,
    pub payloads_received: AtomicU64,
    pub payloads_sent: AtomicU64,
    pub payload_errors: AtomicU64,
    pub mailbox_dropped: AtomicU64,
    pub resets: AtomicU64,
    pub reset_failures: AtomicU64,
}

pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl LinkCounters {
    pub fn snapshot(&self) -> LinkStats {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        LinkStats {
            pings_sent: load(&self.pings_sent),
            pongs_received: load(&self.pongs_received),
            pongs_sent: load(&self.pongs_sent),
            payloads_received: load(&self.payloads_received),
            payloads_sent: load(&self.payloads_sent),
            payload_errors: load(&self.payload_errors),
            mailbox_dropped: load(&self.mailbox_dropped),
            resets: load(&self.resets),
            reset_failures: load(&self.reset_failures),
        }
    }
}
