use crate::{
    constants::{DEFAULT_MIN_SELECTION_GAP, DEFAULT_SKIP_SECONDS, DEFAULT_SUMMARY_WIDTH},
    playback::SkipPolicy,
};

/// Interaction policy for one editing session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    /// Smallest trim region, in seconds.
    pub min_selection_gap: f64,
    /// Skip back / forward step, in seconds.
    pub skip_seconds: f64,
    pub skip_policy: SkipPolicy,
    /// Waveform column count.
    pub summary_width: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_selection_gap: DEFAULT_MIN_SELECTION_GAP,
            skip_seconds: DEFAULT_SKIP_SECONDS,
            skip_policy: SkipPolicy::FullAsset,
            summary_width: DEFAULT_SUMMARY_WIDTH,
        }
    }
}
