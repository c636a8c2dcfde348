use std::path::{Path, PathBuf};

use transport::{clock::MonotonicClock, poll::PollToken};

use crate::{
    buffer::SampleBuffer,
    config::EditorConfig,
    decoder::{AutoDecoder, Decoder},
    error::{EngineError, Result},
    export::{export_range, export_range_to_path, trimmed_file_name},
    output::AudioOutput,
    playback::{PlaybackController, SkipDirection, Tick},
    selection::{TrimRange, TrimSelection},
    waveform::{WaveformSummary, summarize},
};

type CommitListener = Box<dyn FnMut(f64, f64)>;

/// Everything derived from one decoded asset.
#[derive(Debug)]
struct Asset {
    buffer: SampleBuffer,
    summary: WaveformSummary,
    selection: TrimSelection,
}

/// One trim-and-export editing session.
///
/// Owns the decoded asset, its waveform summary, the trim selection and the
/// playback controller. Loading a new asset replaces all of them at once; a
/// failed load leaves the previous asset untouched.
pub struct EditorSession<O: AudioOutput, C: MonotonicClock, D: Decoder = AutoDecoder> {
    config: EditorConfig,
    decoder: D,
    prompt: Option<String>,
    asset: Option<Asset>,
    playback: PlaybackController<O, C>,
    on_commit: Option<CommitListener>,
}

impl<O: AudioOutput, C: MonotonicClock> EditorSession<O, C, AutoDecoder> {
    pub fn new(output: O, clock: C, config: EditorConfig) -> Self {
        Self::with_decoder(output, clock, config, AutoDecoder::new())
    }
}

impl<O: AudioOutput, C: MonotonicClock, D: Decoder> EditorSession<O, C, D> {
    pub fn with_decoder(output: O, clock: C, config: EditorConfig, decoder: D) -> Self {
        Self {
            config,
            decoder,
            prompt: None,
            asset: None,
            playback: PlaybackController::new(output, clock)
                .with_skip(config.skip_seconds, config.skip_policy),
            on_commit: None,
        }
    }

    /// Decodes `bytes` and makes it the session's asset.
    ///
    /// On success playback is torn down, the output context released, the
    /// selection reset to the whole asset and the playhead rewound.
    pub fn load(&mut self, bytes: &[u8]) -> Result<()> {
        let buffer = self.decoder.decode(bytes).inspect_err(|e| {
            log::warn!("asset load failed, keeping previous asset: {e}");
        })?;
        self.load_buffer(buffer);
        Ok(())
    }

    /// Adopts a buffer decoded elsewhere (e.g. by the platform's own codec).
    pub fn load_buffer(&mut self, buffer: SampleBuffer) {
        let summary = summarize(&buffer, self.config.summary_width);
        let selection = TrimSelection::with_min_gap(buffer.duration(), self.config.min_selection_gap);
        self.playback.load(buffer.clone());

        log::info!(
            "loaded asset: {:.3}s, {} Hz, {} channel(s)",
            buffer.duration(),
            buffer.sample_rate(),
            buffer.channel_count()
        );
        self.asset = Some(Asset {
            buffer,
            summary,
            selection,
        });
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = Some(prompt.into());
    }

    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn buffer(&self) -> Option<&SampleBuffer> {
        self.asset.as_ref().map(|a| &a.buffer)
    }

    pub fn summary(&self) -> Option<&WaveformSummary> {
        self.asset.as_ref().map(|a| &a.summary)
    }

    /// Recomputes the waveform for a canvas `width` columns wide.
    pub fn resize_summary(&mut self, width: usize) {
        self.config.summary_width = width;
        if let Some(asset) = &mut self.asset {
            asset.summary = summarize(&asset.buffer, width);
        }
    }

    pub fn selection(&self) -> Option<&TrimSelection> {
        self.asset.as_ref().map(|a| &a.selection)
    }

    pub fn trim(&self) -> Option<TrimRange> {
        self.selection().map(TrimSelection::range)
    }

    /// Moves the trim start; an accepted value also moves the playhead there.
    pub fn set_trim_start(&mut self, value: f64) -> Result<bool> {
        let Some(asset) = &mut self.asset else {
            return Ok(false);
        };
        if !asset.selection.set_start(value) {
            return Ok(false);
        }
        let range = asset.selection.range();
        self.playback.seek(value, range)?;
        Ok(true)
    }

    pub fn set_trim_end(&mut self, value: f64) -> bool {
        self.asset
            .as_mut()
            .is_some_and(|asset| asset.selection.set_end(value))
    }

    pub fn reset_trim(&mut self) {
        if let Some(asset) = &mut self.asset {
            asset.selection.reset();
        }
    }

    /// Registers the host callback that receives `(start, end)` on commit.
    pub fn on_trim_commit(&mut self, listener: impl FnMut(f64, f64) + 'static) {
        self.on_commit = Some(Box::new(listener));
    }

    /// Hands the current selection to the host listener.
    pub fn commit_trim(&mut self) -> Option<TrimRange> {
        let range = self.trim()?;
        if let Some(listener) = &mut self.on_commit {
            listener(range.start, range.end);
        }
        Some(range)
    }

    pub fn play(&mut self) -> Result<PollToken> {
        let trim = self.trim().ok_or(EngineError::NoAsset)?;
        self.playback.play(trim)
    }

    pub fn stop(&mut self) {
        self.playback.stop();
    }

    pub fn toggle(&mut self) -> Result<Option<PollToken>> {
        if self.playback.is_playing() {
            self.playback.stop();
            return Ok(None);
        }
        self.play().map(Some)
    }

    /// One frame of the host's redraw loop.
    pub fn tick(&mut self) -> Tick {
        match self.trim() {
            Some(trim) => self.playback.tick(trim),
            None => Tick::Idle,
        }
    }

    pub fn skip(&mut self, direction: SkipDirection) -> Result<()> {
        let trim = self.trim().ok_or(EngineError::NoAsset)?;
        self.playback.skip(direction, trim)
    }

    pub fn current_time(&self) -> f64 {
        self.playback.current_time()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn playback(&self) -> &PlaybackController<O, C> {
        &self.playback
    }

    /// Encodes the current selection as WAV.
    pub fn export(&self) -> Result<Vec<u8>> {
        let asset = self.asset.as_ref().ok_or(EngineError::NoAsset)?;
        let range = asset.selection.range();
        export_range(&asset.buffer, range.start, range.end)
    }

    /// Writes the current selection to `dir` under its download name.
    pub fn export_to_dir(&self, dir: impl AsRef<Path>, unix_millis: u128) -> Result<PathBuf> {
        let asset = self.asset.as_ref().ok_or(EngineError::NoAsset)?;
        let range = asset.selection.range();
        let path = dir.as_ref().join(trimmed_file_name(unix_millis));
        export_range_to_path(&asset.buffer, range.start, range.end, &path)?;
        Ok(path)
    }
}
