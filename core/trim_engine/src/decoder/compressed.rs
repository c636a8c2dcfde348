use std::io::{Cursor, ErrorKind};

use symphonia::core::{
    audio::Signal,
    codecs::{CODEC_TYPE_NULL, DecoderOptions},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

use crate::{
    buffer::SampleBuffer,
    decoder::Decoder,
    error::{EngineError, Result},
};

/// Decodes compressed assets (MP3, FLAC, Vorbis, AAC/MP4, WAV) with `symphonia`.
///
/// The whole stream is decoded up front into planar `f32`. When the container
/// declares its length, a stream that stops short of it is treated as
/// truncated; only the codec's declared encoder delay and padding may account
/// for missing frames. Containers that declare no length (e.g. MP3 without a
/// Xing header) cannot be checked: a cut mid-stream reads as a normal end.
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder {
    extension_hint: Option<String>,
}

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension_hint(extension: impl Into<String>) -> Self {
        Self {
            extension_hint: Some(extension.into()),
        }
    }
}

fn decode_failed(context: &str, err: impl std::fmt::Display) -> EngineError {
    EngineError::DecodeFailed(format!("{context}: {err}"))
}

impl Decoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<SampleBuffer> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = &self.extension_hint {
            hint.with_extension(extension);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| decode_failed("Unrecognised audio format", e))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| EngineError::DecodeFailed("No audio track found".into()))?;

        let track_id = track.id;
        let declared_frames = track.codec_params.n_frames;
        let tolerance = u64::from(track.codec_params.delay.unwrap_or(0))
            + u64::from(track.codec_params.padding.unwrap_or(0));
        let mut sample_rate = track.codec_params.sample_rate;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| decode_failed("Unsupported codec", e))?;

        let mut channels: Vec<Vec<f32>> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(decode_failed("Error reading packet", e)),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = decoder
                .decode(&packet)
                .map_err(|e| decode_failed("Corrupt audio packet", e))?;

            let spec = *decoded.spec();
            if sample_rate.is_none() {
                sample_rate = Some(spec.rate);
            }
            if channels.is_empty() {
                channels = vec![Vec::new(); spec.channels.count()];
            }

            let mut planar = decoded.make_equivalent::<f32>();
            decoded.convert(&mut planar);
            for (index, channel) in channels.iter_mut().enumerate() {
                if index < planar.spec().channels.count() {
                    channel.extend_from_slice(planar.chan(index));
                }
            }
        }

        let sample_rate = sample_rate
            .filter(|rate| *rate > 0)
            .ok_or_else(|| EngineError::DecodeFailed("Sample rate unknown".into()))?;
        if channels.is_empty() {
            return Err(EngineError::DecodeFailed("Stream contains no audio".into()));
        }

        // A channel layout change mid-stream leaves ragged channels; keep the common prefix.
        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        for channel in &mut channels {
            channel.truncate(frames);
        }

        if let Some(declared) = declared_frames
            && (frames as u64) + tolerance < declared
        {
            return Err(EngineError::DecodeFailed(format!(
                "Stream truncated: decoded {frames} of {declared} frames"
            )));
        }

        let buffer = SampleBuffer::new(sample_rate, channels);
        log::debug!(
            "decoded stream: {} Hz, {} channel(s), {} frames",
            buffer.sample_rate(),
            buffer.channel_count(),
            buffer.frame_count()
        );
        Ok(buffer)
    }
}
