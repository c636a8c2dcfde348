use std::{ops::Range, sync::Arc};

/// Decoded audio held in memory as one `f32` sequence per channel.
///
/// Immutable once built. Clones share the underlying channel data, so the
/// summarizer, the playback controller and the exporter can all hold the
/// same asset without copying it.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Arc<[Vec<f32>]>,
    frame_count: usize,
}

impl SampleBuffer {
    /// Builds a buffer from planar channel data.
    ///
    /// # Panics
    /// If `sample_rate` is zero, `channels` is empty, or the channels differ in length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        assert!(sample_rate > 0, "sample rate must be positive");
        assert!(!channels.is_empty(), "a buffer needs at least one channel");

        let frame_count = channels[0].len();
        assert!(
            channels.iter().all(|c| c.len() == frame_count),
            "all channels must hold the same number of frames"
        );

        Self {
            sample_rate,
            channels: channels.into(),
            frame_count,
        }
    }

    /// Builds a buffer from interleaved samples (`L R L R ...`).
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(sample_rate: u32, channel_count: usize, samples: &[f32]) -> Self {
        assert!(channel_count > 0, "a buffer needs at least one channel");

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }
        Self::new(sample_rate, channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.frame_count as f64 / f64::from(self.sample_rate)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Samples of every channel at `frame`, in channel order.
    pub fn frame(&self, frame: usize) -> Option<impl Iterator<Item = f32> + '_> {
        (frame < self.frame_count).then(|| self.channels.iter().map(move |c| c[frame]))
    }

    /// Copies `range` (clamped to the buffer) into a new buffer with the same
    /// rate and channel layout. Samples are copied verbatim.
    pub fn slice_frames(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.frame_count);
        let start = range.start.min(end);

        let channels = self
            .channels
            .iter()
            .map(|c| c[start..end].to_vec())
            .collect::<Vec<_>>();

        Self::new(self.sample_rate, channels)
    }
}
