/// Frame index at `seconds`, rounded down.
///
/// Negative or non-finite positions map to frame 0.
pub fn seconds_to_frame(seconds: f64, sample_rate: u32) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * f64::from(sample_rate)).floor() as u64
}

pub fn frame_to_seconds(frame: u64, sample_rate: u32) -> f64 {
    frame as f64 / f64::from(sample_rate)
}

/// Formats a position as `m:ss`, e.g. `75.9` -> `1:15`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_owned();
    }
    let whole = seconds.floor() as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}
