//! Suspend/resume signalling for engine threads.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Why a blocked engine thread woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// Keep going: a resume token was consumed, or a sleep ran its course.
    Resumed,
    /// The handler is shutting down; the thread must exit.
    Shutdown,
}

#[derive(Debug, Default)]
struct SignalState {
    pending: bool,
    shutdown: bool,
}

/// A one-slot resume token owned by a single engine.
///
/// `post` sets the token (posting twice still leaves one token). `wait`
/// blocks until a token is available and consumes it. Tokens posted while
/// the engine is not waiting stay pending until its next `wait`.
#[derive(Debug, Default)]
pub struct SuspendSignal {
    state: Mutex<SignalState>,
    cond: Condvar,
}

impl SuspendSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make one resume token available.
    pub fn post(&self) {
        let mut state = self.state.lock();
        state.pending = true;
        self.cond.notify_all();
    }

    /// Block until a token is posted or the signal is shut down.
    pub fn wait(&self) -> Wake {
        let mut state = self.state.lock();
        loop {
            if state.shutdown {
                return Wake::Shutdown;
            }
            if state.pending {
                state.pending = false;
                return Wake::Resumed;
            }
            self.cond.wait(&mut state);
        }
    }

    /// Sleep for `period`. Only shutdown cuts it short; pending tokens are
    /// left for the next `wait`.
    pub fn sleep(&self, period: Duration) -> Wake {
        let deadline = Instant::now() + period;
        let mut state = self.state.lock();
        loop {
            if state.shutdown {
                return Wake::Shutdown;
            }
            if Instant::now() >= deadline {
                return Wake::Resumed;
            }
            self.cond.wait_until(&mut state, deadline);
        }
    }

    /// Wake every waiter for good. Later waits return immediately.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        self.cond.notify_all();
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().pending
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn post_before_wait_is_not_lost() {
        let signal = SuspendSignal::new();
        signal.post();
        assert!(signal.is_pending());
        assert_eq!(signal.wait(), Wake::Resumed);
        assert!(!signal.is_pending());
    }

    #[test]
    fn double_post_is_one_token() {
        let signal = Arc::new(SuspendSignal::new());
        signal.post();
        signal.post();
        assert_eq!(signal.wait(), Wake::Resumed);

        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait())
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());
        signal.post();
        assert_eq!(waiter.join().unwrap(), Wake::Resumed);
    }

    #[test]
    fn wait_blocks_until_posted() {
        let signal = Arc::new(SuspendSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait())
        };
        thread::sleep(Duration::from_millis(30));
        signal.post();
        assert_eq!(waiter.join().unwrap(), Wake::Resumed);
    }

    #[test]
    fn sleep_keeps_pending_token() {
        let signal = SuspendSignal::new();
        signal.post();
        let started = Instant::now();
        assert_eq!(signal.sleep(Duration::from_millis(20)), Wake::Resumed);
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(signal.is_pending());
    }

    #[test]
    fn shutdown_interrupts_wait_and_sleep() {
        let signal = Arc::new(SuspendSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait())
        };
        let sleeper = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.sleep(Duration::from_secs(30)))
        };
        thread::sleep(Duration::from_millis(30));
        signal.shutdown();
        assert_eq!(waiter.join().unwrap(), Wake::Shutdown);
        assert_eq!(sleeper.join().unwrap(), Wake::Shutdown);
        assert_eq!(signal.wait(), Wake::Shutdown);
    }
}
