use rubato::{FastFixedIn, PolynomialDegree, Resampler};

use crate::{buffer::SampleBuffer, output::OutputError};

fn resample_failed(err: impl std::fmt::Display) -> OutputError {
    OutputError::StreamBuildFailed(format!("Resampling failed: {err}"))
}

/// Converts `buffer` to `target_rate` in one pass.
///
/// The resampler's startup delay is dropped and its tail flushed, so the result
/// lines up with the source and holds `frames * target / source` frames.
pub fn resample(buffer: &SampleBuffer, target_rate: u32) -> Result<SampleBuffer, OutputError> {
    let source_rate = buffer.sample_rate();
    if source_rate == target_rate {
        return Ok(buffer.clone());
    }

    let input: Vec<Vec<f32>> = buffer.channels().map(<[f32]>::to_vec).collect();
    let frames = buffer.frame_count();
    let ratio = f64::from(target_rate) / f64::from(source_rate);
    let expected = (frames as f64 * ratio).round() as usize;
    if frames == 0 {
        return Ok(SampleBuffer::new(target_rate, vec![Vec::new(); input.len()]));
    }

    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Septic,
        frames,
        input.len(),
    )
    .map_err(resample_failed)?;
    let delay = resampler.output_delay();

    let mut output = resampler.process(&input, None).map_err(resample_failed)?;
    let tail = resampler
        .process_partial(None::<&[Vec<f32>]>, None)
        .map_err(resample_failed)?;
    for (channel, rest) in output.iter_mut().zip(tail) {
        channel.extend(rest);
        channel.drain(..delay.min(channel.len()));
        channel.resize(expected, 0.0);
    }

    log::debug!(
        "resampled {frames} frames at {source_rate} Hz to {expected} frames at {target_rate} Hz"
    );
    Ok(SampleBuffer::new(target_rate, output))
}
