use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Owner side of a cooperative poll loop.
///
/// The host's frame scheduler keeps a [`PollToken`] and checks it at the top
/// of every tick before rescheduling. Cancelling the handle (or dropping it)
/// kills every token issued from it; a fresh loop needs a fresh handle.
#[derive(Debug)]
pub struct PollHandle {
    live: Arc<AtomicBool>,
}

/// Scheduler side of a poll loop: tells the host whether to keep ticking.
#[derive(Debug, Clone)]
pub struct PollToken {
    live: Arc<AtomicBool>,
}

impl PollHandle {
    pub fn new() -> Self {
        Self {
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn token(&self) -> PollToken {
        PollToken {
            live: Arc::clone(&self.live),
        }
    }

    pub fn cancel(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl Default for PollHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl PollToken {
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}
