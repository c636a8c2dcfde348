/// Smallest trim region, in seconds.
pub const DEFAULT_MIN_SELECTION_GAP: f64 = 0.5;

/// Step used by the skip back / skip forward controls, in seconds.
pub const DEFAULT_SKIP_SECONDS: f64 = 5.0;

/// Column count of the waveform canvas.
pub const DEFAULT_SUMMARY_WIDTH: usize = 800;

/// Size of the canonical PCM WAV header.
pub const WAV_HEADER_LEN: usize = 44;

pub const AUDIO_SAMPLE_EPSILON: f32 = 1e-6;
