use crate::constants::DEFAULT_MIN_SELECTION_GAP;

/// A `[start, end)` region of the asset, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Half-open membership test: `start <= t < end`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

/// The user's trim region over one asset.
///
/// Boundary drags that would break `0 <= start < end <= duration` or shrink
/// the region below `min_gap` are ignored and the last valid region is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimSelection {
    duration: f64,
    min_gap: f64,
    range: TrimRange,
}

impl TrimSelection {
    /// Selects the whole asset.
    pub fn new(duration: f64) -> Self {
        Self::with_min_gap(duration, DEFAULT_MIN_SELECTION_GAP)
    }

    pub fn with_min_gap(duration: f64, min_gap: f64) -> Self {
        assert!(
            duration.is_finite() && duration >= 0.0,
            "duration must be finite and non-negative"
        );
        assert!(min_gap.is_finite() && min_gap >= 0.0, "gap must be finite and non-negative");
        Self {
            duration,
            min_gap,
            range: TrimRange {
                start: 0.0,
                end: duration,
            },
        }
    }

    pub fn range(&self) -> TrimRange {
        self.range
    }

    pub fn start(&self) -> f64 {
        self.range.start
    }

    pub fn end(&self) -> f64 {
        self.range.end
    }

    pub fn duration(&self) -> f64 {
        self.range.duration()
    }

    pub fn asset_duration(&self) -> f64 {
        self.duration
    }

    pub fn min_gap(&self) -> f64 {
        self.min_gap
    }

    /// Moves the start boundary. Returns whether the value was taken.
    pub fn set_start(&mut self, value: f64) -> bool {
        let accepted = value.is_finite() && value >= 0.0 && value < self.range.end - self.min_gap;
        if accepted {
            self.range.start = value;
        } else {
            log::debug!("ignored trim start {value} (end {})", self.range.end);
        }
        accepted
    }

    /// Moves the end boundary. Returns whether the value was taken.
    pub fn set_end(&mut self, value: f64) -> bool {
        let accepted =
            value.is_finite() && value <= self.duration && value > self.range.start + self.min_gap;
        if accepted {
            self.range.end = value;
        } else {
            log::debug!("ignored trim end {value} (start {})", self.range.start);
        }
        accepted
    }

    pub fn reset(&mut self) {
        self.range = TrimRange {
            start: 0.0,
            end: self.duration,
        };
    }

    pub fn start_percent(&self) -> f64 {
        self.percent_of(self.range.start)
    }

    /// Position of the end boundary; `100` for an empty asset.
    pub fn end_percent(&self) -> f64 {
        if self.duration > 0.0 {
            self.percent_of(self.range.end)
        } else {
            100.0
        }
    }

    /// Position of `t` across the whole asset, for overlays and the playhead.
    pub fn percent_of(&self, t: f64) -> f64 {
        if self.duration > 0.0 {
            t / self.duration * 100.0
        } else {
            0.0
        }
    }
}
