use std::io::{Cursor, Read};

use hound::{SampleFormat, WavReader};

use crate::{
    buffer::SampleBuffer,
    decoder::Decoder,
    error::{EngineError, Result},
};

/// Decodes RIFF/WAVE PCM streams with `hound`.
///
/// Supports:
/// - Any channel count (kept planar, no down-mixing)
/// - 8, 16, 24 and 32-bit integer samples, normalised by `2^(bits - 1)`
/// - 32-bit float samples (passed through)
///
/// A stream whose data chunk ends early is rejected instead of being
/// returned short.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavDecoder;

impl WavDecoder {
    fn from_reader<R: Read>(reader: WavReader<R>) -> Result<SampleBuffer> {
        let spec = reader.spec();
        if spec.channels == 0 {
            return Err(EngineError::DecodeFailed("WAV declares zero channels".into()));
        }
        if spec.sample_rate == 0 {
            return Err(EngineError::DecodeFailed("WAV declares a zero sample rate".into()));
        }

        let interleaved = Self::decode_pcm_samples(reader)?;
        let channels = spec.channels as usize;
        if interleaved.len() % channels != 0 {
            return Err(EngineError::DecodeFailed(
                "WAV data ends in the middle of a frame".into(),
            ));
        }

        let buffer = SampleBuffer::from_interleaved(spec.sample_rate, channels, &interleaved);
        log::debug!(
            "decoded WAV: {} Hz, {} channel(s), {} frames",
            buffer.sample_rate(),
            buffer.channel_count(),
            buffer.frame_count()
        );
        Ok(buffer)
    }

    fn decode_pcm_samples<R: Read>(reader: WavReader<R>) -> Result<Vec<f32>> {
        let spec = reader.spec();
        let truncated = |e: hound::Error| EngineError::DecodeFailed(format!("Bad WAV data: {e}"));

        match spec.sample_format {
            SampleFormat::Int => {
                if !matches!(spec.bits_per_sample, 8 | 16 | 24 | 32) {
                    return Err(EngineError::DecodeFailed(format!(
                        "Unsupported WAV bit depth: {}",
                        spec.bits_per_sample
                    )));
                }
                let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|s| s as f32 / scale).map_err(truncated))
                    .collect()
            }
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| s.map_err(truncated))
                .collect(),
        }
    }
}

impl Decoder for WavDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<SampleBuffer> {
        let reader = WavReader::new(Cursor::new(bytes))
            .map_err(|e| EngineError::DecodeFailed(format!("Failed to parse WAV stream: {e}")))?;
        Self::from_reader(reader)
    }
}
