use crate::{
    buffer::SampleBuffer,
    constants::WAV_HEADER_LEN,
    error::{EngineError, Result},
};

const BYTES_PER_SAMPLE: u16 = 2;
const PCM_FORMAT: u16 = 1;

/// Converts one sample to signed 16-bit PCM.
///
/// Clamps to `[-1, 1]`, then scales negatives by `32768` and the rest by
/// `32767` so both ends of the `i16` range are reachable. NaN encodes as `0`.
pub fn quantize(sample: f32) -> i16 {
    let v = sample.clamp(-1.0, 1.0);
    if v < 0.0 {
        (v * 32768.0).round() as i16
    } else {
        (v * 32767.0).round() as i16
    }
}

/// Serialises the whole buffer as a canonical 44-byte-header PCM WAV stream
/// with interleaved 16-bit little-endian samples.
pub fn encode_wav(buffer: &SampleBuffer) -> Result<Vec<u8>> {
    let channels = buffer.channel_count();
    let block_align = channels * usize::from(BYTES_PER_SAMPLE);
    let data_len = (buffer.frame_count() as u64) * block_align as u64;
    let file_len = WAV_HEADER_LEN as u64 + data_len;

    let too_large = || EngineError::ExportTooLarge { bytes: file_len };
    let riff_len = u32::try_from(file_len - 8).map_err(|_| too_large())?;
    let data_len = u32::try_from(data_len).map_err(|_| too_large())?;
    let channel_count = u16::try_from(channels).map_err(|_| too_large())?;
    let block_align = u16::try_from(block_align).map_err(|_| too_large())?;
    let byte_rate = buffer
        .sample_rate()
        .checked_mul(u32::from(block_align))
        .ok_or_else(too_large)?;

    let mut out = Vec::with_capacity(file_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_len.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16_u32.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    out.extend_from_slice(&channel_count.to_le_bytes());
    out.extend_from_slice(&buffer.sample_rate().to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&(BYTES_PER_SAMPLE * 8).to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    for frame in 0..buffer.frame_count() {
        for channel in buffer.channels() {
            out.extend_from_slice(&quantize(channel[frame]).to_le_bytes());
        }
    }

    debug_assert_eq!(out.len() as u64, file_len);
    Ok(out)
}
