use std::{fs, path::Path};

use transport::timecode::seconds_to_frame;

use crate::{
    buffer::SampleBuffer,
    error::{EngineError, Result},
};

pub mod wav;

pub use wav::{encode_wav, quantize};

/// Cuts `[start, end)` seconds out of `buffer` and encodes it as WAV.
///
/// Frames are `floor(t * sample_rate)`; an end past the buffer is clamped to
/// its last frame. Samples are copied verbatim (no resampling, no gain).
pub fn export_range(buffer: &SampleBuffer, start: f64, end: f64) -> Result<Vec<u8>> {
    let invalid = || EngineError::InvalidRange { start, end };
    if !start.is_finite() || !end.is_finite() || end <= start {
        return Err(invalid());
    }

    let rate = buffer.sample_rate();
    let start_frame = seconds_to_frame(start, rate) as usize;
    let end_frame = (seconds_to_frame(end, rate) as usize).min(buffer.frame_count());
    if end_frame <= start_frame {
        return Err(invalid());
    }

    let bytes = encode_wav(&buffer.slice_frames(start_frame..end_frame))?;
    log::info!(
        "exported {} frames ({:.3}s..{:.3}s) as {} bytes",
        end_frame - start_frame,
        start,
        end,
        bytes.len()
    );
    Ok(bytes)
}

/// Like [`export_range`], then writes the stream to `path`.
///
/// Nothing is created when the range is rejected.
pub fn export_range_to_path(
    buffer: &SampleBuffer,
    start: f64,
    end: f64,
    path: impl AsRef<Path>,
) -> Result<()> {
    let bytes = export_range(buffer, start, end)?;
    fs::write(path.as_ref(), bytes)?;
    log::debug!("wrote {}", path.as_ref().display());
    Ok(())
}

/// Download name for an export taken at `unix_millis`.
pub fn trimmed_file_name(unix_millis: u128) -> String {
    format!("trimmed-audio-{unix_millis}.wav")
}

#[cfg(test)]
mod export_tests {
    use std::io::Cursor;

    use super::*;
    use crate::decoder::{Decoder, WavDecoder};

    fn ten_second_mono() -> SampleBuffer {
        let samples = (0..441_000).map(|i| ((i % 200) as f32 / 100.0) - 1.0).collect();
        SampleBuffer::new(44100, vec![samples])
    }

    #[test]
    fn test_trimmed_mono_file_size() {
        let bytes = export_range(&ten_second_mono(), 2.0, 7.0).unwrap();
        assert_eq!(bytes.len(), 441_044);
        assert_eq!(
            u32::from_le_bytes([bytes[40], bytes[41], bytes[42], bytes[43]]),
            441_000
        );
    }

    #[test]
    fn test_round_trip_through_decoder() {
        let buffer = SampleBuffer::new(
            8000,
            vec![
                (0..16000).map(|i| (i as f32 / 16000.0) - 0.5).collect(),
                (0..16000).map(|i| 0.5 - (i as f32 / 16000.0)).collect(),
            ],
        );
        let (start, end) = (0.3337, 1.271);
        let bytes = export_range(&buffer, start, end).unwrap();
        let decoded = WavDecoder.decode(&bytes).unwrap();

        let expected = (end * 8000.0_f64).floor() as usize - (start * 8000.0_f64).floor() as usize;
        assert_eq!(decoded.frame_count(), expected);
        assert_eq!(decoded.sample_rate(), 8000);
        assert_eq!(decoded.channel_count(), 2);

        let first = buffer.channel(1).unwrap()[2669];
        assert!((decoded.channel(1).unwrap()[0] - first).abs() < 1.0 / 16000.0);
    }

    #[test]
    fn test_hound_reads_export() {
        let buffer = SampleBuffer::new(22050, vec![vec![1.0, -1.0, 0.0, 0.25]]);
        let bytes = export_range(&buffer, 0.0, 1.0).unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        let samples = reader.into_samples::<i16>().collect::<std::result::Result<Vec<_>, _>>().unwrap();
        assert_eq!(samples, vec![32767, -32768, 0, 8192]);
    }

    #[test]
    fn test_inverted_and_empty_ranges_are_rejected() {
        let buffer = ten_second_mono();
        for (start, end) in [(5.0, 5.0), (6.0, 2.0), (10.5, 12.0), (f64::NAN, 1.0)] {
            let result = export_range(&buffer, start, end);
            assert!(matches!(result, Err(EngineError::InvalidRange { .. })), "{start}..{end}");
        }
    }

    #[test]
    fn test_sub_frame_range_is_rejected() {
        let buffer = SampleBuffer::new(10, vec![vec![0.0; 100]]);
        let result = export_range(&buffer, 1.01, 1.05);
        assert!(matches!(result, Err(EngineError::InvalidRange { .. })));
    }

    #[test]
    fn test_end_past_buffer_is_clamped() {
        let buffer = SampleBuffer::new(10, vec![vec![0.0; 100]]);
        let bytes = export_range(&buffer, 9.0, 42.0).unwrap();
        assert_eq!(bytes.len(), 44 + 10 * 2);
    }

    #[test]
    fn test_rejected_range_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let result = export_range_to_path(&ten_second_mono(), 3.0, 1.0, &path);
        assert!(result.is_err());
        assert!(!path.exists());

        export_range_to_path(&ten_second_mono(), 1.0, 3.0, &path).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 44 + 88200 * 2);
    }

    #[test]
    fn test_trimmed_file_name() {
        assert_eq!(trimmed_file_name(1_700_000_000_123), "trimmed-audio-1700000000123.wav");
    }
}
