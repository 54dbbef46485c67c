//! Engine thread lifecycle: spawn on first start, resume token afterwards.

use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::config::EngineConfig;
use crate::error::{LinkError, Result};
use crate::signal::{SuspendSignal, Wake};

/// Lifecycle state of one engine thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    NeverStarted,
    Running,
    Suspended,
    Stopped,
}

impl EngineStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => EngineStatus::Running,
            2 => EngineStatus::Suspended,
            3 => EngineStatus::Stopped,
            _ => EngineStatus::NeverStarted,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            EngineStatus::NeverStarted => 0,
            EngineStatus::Running => 1,
            EngineStatus::Suspended => 2,
            EngineStatus::Stopped => 3,
        }
    }
}

/// What a call to [`Engine::start`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Started {
    Spawned,
    Resumed,
}

pub(crate) struct Engine {
    label: &'static str,
    config: EngineConfig,
    signal: SuspendSignal,
    status: AtomicU8,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    pub fn new(label: &'static str, config: EngineConfig) -> Self {
        Self {
            label,
            config,
            signal: SuspendSignal::new(),
            status: AtomicU8::new(EngineStatus::NeverStarted.as_u8()),
            thread: Mutex::new(None),
        }
    }

    /// Spawn the thread running `body` on first call; post a resume token on
    /// every later call. `body` is dropped unused when only a token is posted.
    pub fn start<F>(&self, body: F) -> Result<Started>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut thread = self.thread.lock();
        if self.status() == EngineStatus::Stopped {
            return Err(LinkError::Stopped);
        }
        if thread.is_some() {
            self.signal.post();
            trace!(engine = self.label, "resume token posted");
            return Ok(Started::Resumed);
        }

        let mut builder = thread::Builder::new().name(self.config.name.clone());
        if let Some(stack_size) = self.config.stack_size {
            builder = builder.stack_size(stack_size);
        }
        if let Some(priority) = self.config.priority {
            debug!(engine = self.label, priority, "priority hint recorded, not applied");
        }

        self.set_status(EngineStatus::Running);
        match builder.spawn(body) {
            Ok(handle) => {
                *thread = Some(handle);
                info!(engine = self.label, name = %self.config.name, "engine thread spawned");
                Ok(Started::Spawned)
            }
            Err(source) => {
                self.set_status(EngineStatus::NeverStarted);
                Err(LinkError::Spawn {
                    engine: self.label,
                    source,
                })
            }
        }
    }

    /// Park the calling engine thread until resumed or shut down.
    pub fn suspend(&self) -> Wake {
        self.transition(EngineStatus::Running, EngineStatus::Suspended);
        let wake = self.signal.wait();
        if wake == Wake::Resumed {
            self.transition(EngineStatus::Suspended, EngineStatus::Running);
        }
        wake
    }

    /// Sleep that only shutdown interrupts.
    pub fn sleep(&self, period: Duration) -> Wake {
        self.signal.sleep(period)
    }

    /// Mark the engine stopped, wake its thread and hand back the handle.
    pub fn shutdown(&self) -> Option<JoinHandle<()>> {
        let mut thread = self.thread.lock();
        self.set_status(EngineStatus::Stopped);
        self.signal.shutdown();
        thread.take()
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    fn set_status(&self, status: EngineStatus) {
        self.status.store(status.as_u8(), Ordering::SeqCst);
    }

    fn transition(&self, from: EngineStatus, to: EngineStatus) {
        let _ = self.status.compare_exchange(
            from.as_u8(),
            to.as_u8(),
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

/// Join an engine thread unless it is the calling thread.
pub(crate) fn join(label: &'static str, handle: JoinHandle<()>) -> Result<()> {
    if handle.thread().id() == thread::current().id() {
        debug!(engine = label, "stop called from the engine's own thread; not joining");
        return Ok(());
    }
    handle
        .join()
        .map_err(|_| LinkError::Panicked { engine: label })
}
