use crate::buffer::SampleBuffer;

/// Min/max of one contiguous window of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeColumn {
    pub min: f32,
    pub max: f32,
}

impl EnvelopeColumn {
    pub const SILENT: Self = Self { min: 0.0, max: 0.0 };
}

/// Vertical placement of one rendered bar, in the caller's units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub top: f32,
    pub height: f32,
}

/// Fixed-width min/max envelope of the first channel, one column per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSummary {
    columns: Vec<EnvelopeColumn>,
}

impl WaveformSummary {
    pub fn columns(&self) -> &[EnvelopeColumn] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Maps every column onto a canvas of `height` units.
    ///
    /// `top = (1 + min) / 2 * height`, `height = (max - min) / 2 * height`,
    /// never thinner than one unit so silent stretches stay visible.
    pub fn bars(&self, height: f32) -> Vec<Bar> {
        let amp = height / 2.0;
        self.columns
            .iter()
            .map(|c| Bar {
                top: (1.0 + c.min) * amp,
                height: ((c.max - c.min) * amp).max(1.0),
            })
            .collect()
    }
}

/// Reduces `buffer` to exactly `width` envelope columns.
///
/// Windows are `ceil(frames / width)` long; the last one may be shorter, and
/// columns past the end of a short buffer come out as `0.0 / 0.0`. Peaks are
/// kept (min/max, not averages) so transients survive the reduction.
///
/// # Panics
/// If `width` is zero.
pub fn summarize(buffer: &SampleBuffer, width: usize) -> WaveformSummary {
    assert!(width > 0, "waveform width must be positive");

    let data = buffer.channel(0).unwrap_or_default();
    let step = data.len().div_ceil(width).max(1);

    let columns = (0..width)
        .map(|i| {
            let start = (i * step).min(data.len());
            let end = (start + step).min(data.len());
            envelope(&data[start..end])
        })
        .collect();

    WaveformSummary { columns }
}

fn envelope(window: &[f32]) -> EnvelopeColumn {
    if window.is_empty() {
        return EnvelopeColumn::SILENT;
    }
    window.iter().fold(
        EnvelopeColumn {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        },
        |acc, &s| EnvelopeColumn {
            min: acc.min.min(s),
            max: acc.max.max(s),
        },
    )
}

#[cfg(test)]
mod waveform_tests {
    use super::*;

    fn mono(samples: Vec<f32>) -> SampleBuffer {
        SampleBuffer::new(8000, vec![samples])
    }

    #[test]
    fn test_width_is_exact_for_long_buffers() {
        let buffer = mono((0..1001).map(|i| (i as f32 / 1000.0) - 0.5).collect());
        let summary = summarize(&buffer, 10);
        assert_eq!(summary.width(), 10);
        // step = ceil(1001 / 10) = 101, last window holds 92 frames
        assert_eq!(summary.columns()[0].min, -0.5);
        assert!((summary.columns()[9].max - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_short_buffer_pads_with_silent_columns() {
        let summary = summarize(&mono(vec![0.5, -0.25, 0.75]), 8);
        assert_eq!(summary.width(), 8);
        assert_eq!(summary.columns()[0], EnvelopeColumn { min: 0.5, max: 0.5 });
        assert_eq!(summary.columns()[2], EnvelopeColumn { min: 0.75, max: 0.75 });
        assert!(summary.columns()[3..].iter().all(|c| *c == EnvelopeColumn::SILENT));
    }

    #[test]
    fn test_empty_buffer_is_all_silent() {
        let summary = summarize(&mono(Vec::new()), 4);
        assert_eq!(summary.columns(), &[EnvelopeColumn::SILENT; 4]);
    }

    #[test]
    fn test_transient_peak_survives() {
        let mut samples = vec![0.0; 400];
        samples[123] = 0.95;
        samples[124] = -0.9;
        let summary = summarize(&mono(samples), 4);
        assert_eq!(summary.columns()[1], EnvelopeColumn { min: -0.9, max: 0.95 });
        assert_eq!(summary.columns()[0], EnvelopeColumn::SILENT);
    }

    #[test]
    fn test_uses_first_channel_only() {
        let buffer = SampleBuffer::new(8000, vec![vec![0.1, 0.2], vec![-1.0, 1.0]]);
        let summary = summarize(&buffer, 1);
        assert_eq!(summary.columns()[0], EnvelopeColumn { min: 0.1, max: 0.2 });
    }

    #[test]
    fn test_bars_keep_minimum_height() {
        let summary = summarize(&mono(vec![0.0, 0.0, -1.0, 1.0]), 2);
        let bars = summary.bars(128.0);
        assert_eq!(bars[0], Bar { top: 64.0, height: 1.0 });
        assert_eq!(bars[1], Bar { top: 0.0, height: 128.0 });
    }

    #[test]
    #[should_panic(expected = "width must be positive")]
    fn test_zero_width_is_a_precondition_violation() {
        let _ = summarize(&mono(vec![0.0]), 0);
    }
}
