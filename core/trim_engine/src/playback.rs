use transport::{
    clock::MonotonicClock,
    poll::{PollHandle, PollToken},
};

use crate::{
    buffer::SampleBuffer,
    constants::DEFAULT_SKIP_SECONDS,
    error::{EngineError, Result},
    output::{AudioOutput, OutputError, SoundingSource},
    selection::TrimRange,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDirection {
    Back,
    Forward,
}

/// Bounds applied to the playhead by [`PlaybackController::skip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipPolicy {
    /// Free scrubbing over `[0, duration]`.
    #[default]
    FullAsset,
    /// Scrubbing confined to `[trim start, trim end]`.
    Selection,
}

/// Result of one poll-loop tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Still playing; reschedule. Carries the new playhead.
    Continue(f64),
    /// The trim end was reached; the playhead went back to the trim start.
    Looped(f64),
    /// Nothing is playing; do not reschedule.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_time: f64,
    /// Clock reading at which the playhead would have been `0`.
    pub clock_anchor: f64,
}

/// Drives bounded playback of one asset from a polling clock.
///
/// At most one source sounds at a time: starting while already playing tears
/// the previous session down first. The output context is released whenever
/// the asset changes and when the controller is dropped.
pub struct PlaybackController<O: AudioOutput, C: MonotonicClock> {
    output: O,
    clock: C,
    buffer: Option<SampleBuffer>,
    state: PlaybackState,
    source: Option<Box<dyn SoundingSource>>,
    poll: Option<PollHandle>,
    skip_seconds: f64,
    skip_policy: SkipPolicy,
}

impl<O: AudioOutput, C: MonotonicClock> PlaybackController<O, C> {
    pub fn new(output: O, clock: C) -> Self {
        Self {
            output,
            clock,
            buffer: None,
            state: PlaybackState {
                is_playing: false,
                current_time: 0.0,
                clock_anchor: 0.0,
            },
            source: None,
            poll: None,
            skip_seconds: DEFAULT_SKIP_SECONDS,
            skip_policy: SkipPolicy::default(),
        }
    }

    pub fn with_skip(mut self, seconds: f64, policy: SkipPolicy) -> Self {
        self.skip_seconds = seconds;
        self.skip_policy = policy;
        self
    }

    /// Swaps in a new asset: stops playback, closes the output context and
    /// rewinds to `0`.
    pub fn load(&mut self, buffer: SampleBuffer) {
        self.release();
        self.buffer = Some(buffer);
        self.state.current_time = 0.0;
    }

    /// Stops playback and closes the output context.
    pub fn release(&mut self) {
        self.stop();
        self.output.close();
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn transport(&self) -> TransportState {
        if self.state.is_playing {
            TransportState::Playing
        } else {
            TransportState::Stopped
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn duration(&self) -> f64 {
        self.buffer.as_ref().map_or(0.0, SampleBuffer::duration)
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    /// Token for the current poll loop, if one is running.
    pub fn poll_token(&self) -> Option<PollToken> {
        self.poll.as_ref().map(PollHandle::token)
    }

    /// Starts a playback session inside `trim`.
    ///
    /// Resumes from the playhead when it lies in `[trim.start, trim.end)`,
    /// otherwise from `trim.start`. The returned token stays live until the
    /// session ends; the host ticks while it is.
    pub fn play(&mut self, trim: TrimRange) -> Result<PollToken> {
        if self.state.is_playing {
            self.stop();
        }

        let offset = if trim.contains(self.state.current_time) {
            self.state.current_time
        } else {
            trim.start
        };

        self.start_source(offset)?;

        let poll = PollHandle::new();
        let token = poll.token();
        self.poll = Some(poll);
        self.state.is_playing = true;
        log::info!("playback started at {offset:.3}s (trim {:.3}..{:.3})", trim.start, trim.end);
        Ok(token)
    }

    /// Halts the sounding source and cancels the poll loop. Idempotent.
    pub fn stop(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.cancel();
        }

        self.halt_source();

        if self.state.is_playing {
            self.state.is_playing = false;
            log::info!("playback stopped at {:.3}s", self.state.current_time);
        }
    }

    /// Play/pause button.
    pub fn toggle(&mut self, trim: TrimRange) -> Result<Option<PollToken>> {
        if self.state.is_playing {
            self.stop();
            Ok(None)
        } else {
            self.play(trim).map(Some)
        }
    }

    /// One poll-loop step: reads the clock once and moves the playhead.
    ///
    /// Reaching `trim.end` stops playback and puts the playhead back on
    /// `trim.start`.
    pub fn tick(&mut self, trim: TrimRange) -> Tick {
        let live = self.poll.as_ref().is_some_and(PollHandle::is_live);
        if !self.state.is_playing || !live {
            return Tick::Idle;
        }

        let now = self.clock.now() - self.state.clock_anchor;
        if now >= trim.end {
            self.stop();
            self.state.current_time = trim.start;
            log::debug!("reached trim end {:.3}s, back to {:.3}s", trim.end, trim.start);
            return Tick::Looped(trim.start);
        }

        // Within one session the playhead never moves backwards.
        self.state.current_time = now.max(self.state.current_time).min(self.duration());
        Tick::Continue(self.state.current_time)
    }

    /// Moves the playhead to `t`, clamped to `[0, duration]`.
    ///
    /// While playing, the source restarts at the new position (snapped into
    /// `trim` like [`Self::play`]) without ending the poll loop.
    pub fn seek(&mut self, t: f64, trim: TrimRange) -> Result<()> {
        let target = if t.is_finite() { t.clamp(0.0, self.duration()) } else { 0.0 };
        self.state.current_time = target;

        if self.state.is_playing {
            let offset = if trim.contains(target) { target } else { trim.start };
            self.halt_source();
            if let Err(e) = self.start_source(offset) {
                self.stop();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Moves the playhead by the skip step, clamped per the skip policy.
    pub fn skip(&mut self, direction: SkipDirection, trim: TrimRange) -> Result<()> {
        let delta = match direction {
            SkipDirection::Back => -self.skip_seconds,
            SkipDirection::Forward => self.skip_seconds,
        };
        let (low, high) = match self.skip_policy {
            SkipPolicy::FullAsset => (0.0, self.duration()),
            SkipPolicy::Selection => (trim.start, trim.end),
        };
        let target = (self.state.current_time + delta).clamp(low, high);
        self.seek(target, trim)
    }

    /// Stops the sounding source, if any. A source that already finished is not an error.
    fn halt_source(&mut self) {
        let Some(mut source) = self.source.take() else {
            return;
        };
        match source.stop() {
            Ok(()) => {}
            Err(OutputError::AlreadyStopped) => {
                log::debug!("source had already stopped");
            }
            Err(e) => log::warn!("failed to stop source: {e}"),
        }
    }

    fn start_source(&mut self, offset: f64) -> Result<()> {
        let buffer = self.buffer.as_ref().ok_or(EngineError::NoAsset)?;
        let source = self.output.start(buffer, offset)?;
        self.source = Some(source);
        self.state.current_time = offset;
        self.state.clock_anchor = self.clock.now() - offset;
        Ok(())
    }
}

impl<O: AudioOutput, C: MonotonicClock> Drop for PlaybackController<O, C> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod playback_tests {
    use transport::clock::ManualClock;

    use super::*;
    use crate::output::testing::RecordingOutput;

    fn controller(seconds: usize) -> (PlaybackController<RecordingOutput, ManualClock>, ManualClock) {
        let clock = ManualClock::starting_at(100.0);
        let mut controller = PlaybackController::new(RecordingOutput::default(), clock.clone());
        controller.load(SampleBuffer::new(1000, vec![vec![0.0; seconds * 1000]]));
        (controller, clock)
    }

    fn trim(start: f64, end: f64) -> TrimRange {
        TrimRange { start, end }
    }

    #[test]
    fn test_play_from_stopped_snaps_into_trim() {
        let (mut ctl, _) = controller(10);
        ctl.play(trim(2.0, 5.0)).unwrap();

        assert_eq!(ctl.transport(), TransportState::Playing);
        assert_eq!(ctl.current_time(), 2.0);
        assert_eq!(ctl.state().clock_anchor, 98.0);
        assert_eq!(ctl.output().log.borrow().starts, vec![2.0]);
    }

    #[test]
    fn test_play_resumes_inside_trim() {
        let (mut ctl, clock) = controller(10);
        ctl.play(trim(2.0, 5.0)).unwrap();
        clock.advance(1.5);
        ctl.tick(trim(2.0, 5.0));
        ctl.stop();

        clock.advance(10.0);
        ctl.play(trim(2.0, 5.0)).unwrap();
        assert_eq!(ctl.current_time(), 3.5);
        assert_eq!(ctl.output().log.borrow().starts, vec![2.0, 3.5]);
    }

    #[test]
    fn test_ticks_past_trim_end_loop_to_start() {
        let (mut ctl, clock) = controller(10);
        let region = trim(2.0, 5.0);
        let token = ctl.play(region).unwrap();

        clock.advance(1.0);
        assert_eq!(ctl.tick(region), Tick::Continue(3.0));
        clock.advance(1.9);
        assert!(matches!(ctl.tick(region), Tick::Continue(t) if (t - 4.9).abs() < 1e-9));

        clock.advance(0.2);
        assert_eq!(ctl.tick(region), Tick::Looped(2.0));
        assert_eq!(ctl.current_time(), 2.0);
        assert_eq!(ctl.transport(), TransportState::Stopped);
        assert!(!token.is_live());
        assert_eq!(ctl.tick(region), Tick::Idle);
    }

    #[test]
    fn test_playhead_is_monotonic_within_a_session() {
        let (mut ctl, clock) = controller(10);
        let region = trim(0.0, 10.0);
        ctl.play(region).unwrap();

        let mut last = ctl.current_time();
        for _ in 0..50 {
            clock.advance(0.016);
            if let Tick::Continue(t) = ctl.tick(region) {
                assert!(t >= last);
                last = t;
            }
        }
        assert!((last - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_play_while_playing_tears_down_first() {
        let (mut ctl, clock) = controller(10);
        let region = trim(1.0, 9.0);
        let first = ctl.play(region).unwrap();
        clock.advance(2.0);
        ctl.tick(region);

        let second = ctl.play(region).unwrap();
        assert!(!first.is_live());
        assert!(second.is_live());

        let log = ctl.output().log.borrow();
        assert_eq!(log.max_sounding, 1);
        assert_eq!(log.sounding, 1);
        assert_eq!(log.stops, 1);
        assert_eq!(log.starts, vec![1.0, 3.0]);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut ctl, _) = controller(10);
        ctl.stop();
        ctl.play(trim(0.0, 10.0)).unwrap();
        ctl.stop();
        ctl.stop();

        let log = ctl.output().log.borrow();
        assert_eq!(log.stops, 1);
        assert_eq!(log.sounding, 0);
    }

    #[test]
    fn test_finished_source_refusal_is_tolerated() {
        let (mut ctl, _) = controller(10);
        ctl.output().log.borrow_mut().finish_next = true;
        ctl.play(trim(0.0, 10.0)).unwrap();
        ctl.stop();

        assert!(!ctl.is_playing());
        assert_eq!(ctl.output().log.borrow().refused_stops, 1);
    }

    #[test]
    fn test_stop_cancels_loop_and_keeps_playhead() {
        let (mut ctl, clock) = controller(10);
        let region = trim(0.0, 10.0);
        let token = ctl.play(region).unwrap();
        clock.advance(4.0);
        ctl.tick(region);
        ctl.stop();

        assert!(!token.is_live());
        clock.advance(1.0);
        assert_eq!(ctl.tick(region), Tick::Idle);
        assert_eq!(ctl.current_time(), 4.0);
    }

    #[test]
    fn test_skip_clamps_to_asset() {
        let (mut ctl, _) = controller(10);
        let region = trim(2.0, 7.0);

        ctl.skip(SkipDirection::Forward, region).unwrap();
        assert_eq!(ctl.current_time(), 5.0);
        ctl.skip(SkipDirection::Forward, region).unwrap();
        ctl.skip(SkipDirection::Forward, region).unwrap();
        assert_eq!(ctl.current_time(), 10.0);
        ctl.skip(SkipDirection::Back, region).unwrap();
        ctl.skip(SkipDirection::Back, region).unwrap();
        ctl.skip(SkipDirection::Back, region).unwrap();
        assert_eq!(ctl.current_time(), 0.0);
    }

    #[test]
    fn test_skip_confined_to_selection() {
        let (ctl, _) = controller(10);
        let mut ctl = ctl.with_skip(5.0, SkipPolicy::Selection);
        let region = trim(2.0, 7.0);

        ctl.skip(SkipDirection::Forward, region).unwrap();
        assert_eq!(ctl.current_time(), 5.0);
        ctl.skip(SkipDirection::Forward, region).unwrap();
        assert_eq!(ctl.current_time(), 7.0);
        ctl.skip(SkipDirection::Back, region).unwrap();
        ctl.skip(SkipDirection::Back, region).unwrap();
        assert_eq!(ctl.current_time(), 2.0);
    }

    #[test]
    fn test_skip_while_playing_restarts_source_and_keeps_loop() {
        let (mut ctl, clock) = controller(20);
        let region = trim(0.0, 20.0);
        let token = ctl.play(region).unwrap();
        clock.advance(1.0);
        ctl.tick(region);

        ctl.skip(SkipDirection::Forward, region).unwrap();
        assert!(token.is_live());
        assert_eq!(ctl.current_time(), 6.0);

        clock.advance(0.5);
        assert_eq!(ctl.tick(region), Tick::Continue(6.5));

        let log = ctl.output().log.borrow();
        assert_eq!(log.starts, vec![0.0, 6.0]);
        assert_eq!(log.max_sounding, 1);
    }

    #[test]
    fn test_seek_while_playing_survives_failed_stop() {
        let (mut ctl, _) = controller(10);
        let region = trim(0.0, 10.0);
        ctl.output().log.borrow_mut().fail_next_stop = true;
        let token = ctl.play(region).unwrap();

        ctl.seek(3.0, region).unwrap();
        assert!(token.is_live());
        assert!(ctl.is_playing());
        assert_eq!(ctl.current_time(), 3.0);

        let log = ctl.output().log.borrow();
        assert_eq!(log.failed_stops, 1);
        assert_eq!(log.starts, vec![0.0, 3.0]);
        assert_eq!(log.sounding, 1);
    }

    #[test]
    fn test_play_without_asset_fails() {
        let mut ctl = PlaybackController::new(RecordingOutput::default(), ManualClock::new());
        let result = ctl.play(trim(0.0, 1.0));
        assert!(matches!(result, Err(EngineError::NoAsset)));
        assert!(!ctl.is_playing());
    }

    #[test]
    fn test_failed_start_leaves_controller_stopped() {
        let (mut ctl, _) = controller(10);
        ctl.output().log.borrow_mut().fail_next_start = true;
        let result = ctl.play(trim(0.0, 10.0));
        assert!(matches!(result, Err(EngineError::Output(OutputError::DeviceNotFound))));
        assert!(!ctl.is_playing());
        assert!(ctl.poll_token().is_none());
    }

    #[test]
    fn test_load_releases_output_context() {
        let (mut ctl, _) = controller(10);
        ctl.play(trim(0.0, 10.0)).unwrap();
        let log = ctl.output().log.clone();

        ctl.load(SampleBuffer::new(1000, vec![vec![0.0; 500]]));
        assert!(!ctl.is_playing());
        assert_eq!(ctl.current_time(), 0.0);
        assert_eq!(log.borrow().closes, 1);
        assert_eq!(log.borrow().sounding, 0);

        ctl.play(trim(0.0, 0.5)).unwrap();
        drop(ctl);
        assert_eq!(log.borrow().closes, 2);
        assert_eq!(log.borrow().sounding, 0);
    }

    #[test]
    fn test_toggle() {
        let (mut ctl, _) = controller(10);
        assert!(ctl.toggle(trim(0.0, 10.0)).unwrap().is_some());
        assert!(ctl.is_playing());
        assert!(ctl.toggle(trim(0.0, 10.0)).unwrap().is_none());
        assert!(!ctl.is_playing());
    }
}
