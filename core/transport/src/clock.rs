use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Instant,
};

/// A source of monotonically non-decreasing time, in seconds.
///
/// The playback controller reads it once per tick; the origin is arbitrary.
pub trait MonotonicClock {
    fn now(&self) -> f64;
}

/// Wall-time monotonic clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Clock advanced explicitly by its owner.
///
/// Clones share the same time, so a host can hand one clone to the engine and
/// keep another to drive it.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    seconds_bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(seconds: f64) -> Self {
        let clock = Self::new();
        clock.set(seconds);
        clock
    }

    /// Moves time forward. Negative deltas are ignored so the clock stays monotonic.
    pub fn advance(&self, seconds: f64) {
        if seconds <= 0.0 {
            return;
        }
        let _ = self
            .seconds_bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                Some((f64::from_bits(bits) + seconds).to_bits())
            });
    }

    /// Jumps to `seconds` if that is not earlier than the current time.
    pub fn set(&self, seconds: f64) {
        let _ = self
            .seconds_bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                (seconds >= f64::from_bits(bits)).then_some(seconds.to_bits())
            });
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.seconds_bits.load(Ordering::Acquire))
    }
}

/// Clock driven by the audio render callback.
///
/// Every rendered frame moves time forward by `1 / sample_rate` seconds, so
/// the reported time follows what the device has actually consumed rather
/// than the wall clock. The handle is cheap to clone and safe to advance from
/// the render thread.
#[derive(Debug, Clone)]
pub struct SampleClock {
    sample_rate: f64,
    frames: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
}

impl SampleClock {
    pub fn new(sample_rate: f64) -> Self {
        assert!(sample_rate > 0.0, "sample rate must be positive");
        Self {
            sample_rate,
            frames: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Records `frames` rendered frames. Returns `false` when the clock is stopped.
    pub fn advance_by(&self, frames: u64) -> bool {
        if !self.running.load(Ordering::Acquire) {
            return false;
        }
        self.frames.fetch_add(frames, Ordering::AcqRel);
        true
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::Release);
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl MonotonicClock for SampleClock {
    fn now(&self) -> f64 {
        self.frames() as f64 / self.sample_rate
    }
}


#[cfg(test)]
mod sample_clock_tests {
    use super::*;

    const SAMPLE_RATE: f64 = 44100.0;

    #[test]
    fn test_time_follows_rendered_frames() {
        let clock = SampleClock::new(SAMPLE_RATE);
        clock.advance_by(22050);
        assert!((clock.now() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_stop_prevents_advance() {
        let clock = SampleClock::new(SAMPLE_RATE);
        clock.stop();
        assert!(!clock.advance_by(44100));
        assert_eq!(clock.frames(), 0);

        clock.start();
        assert!(clock.advance_by(44100));
        assert!((clock.now() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_thread_handle_advances_shared_clock() {
        let clock = SampleClock::new(SAMPLE_RATE);
        let render = clock.clone();
        let worker = std::thread::spawn(move || {
            for _ in 0..10 {
                render.advance_by(441);
            }
        });
        worker.join().unwrap();
        assert_eq!(clock.frames(), 4410);
    }
}
