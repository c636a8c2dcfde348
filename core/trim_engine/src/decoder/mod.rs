use crate::{buffer::SampleBuffer, error::Result};

pub mod compressed;
pub mod wav;

pub use compressed::SymphoniaDecoder;
pub use wav::WavDecoder;

/// Turns an encoded audio asset into a [`SampleBuffer`].
///
/// Implementations must fail with [`crate::error::EngineError::DecodeFailed`]
/// rather than return an empty or shortened buffer when the input is
/// unrecognised or truncated.
pub trait Decoder {
    fn decode(&self, bytes: &[u8]) -> Result<SampleBuffer>;
}

/// Picks a decoder from the stream's magic bytes: RIFF/WAVE goes through
/// [`WavDecoder`], everything else through [`SymphoniaDecoder`].
#[derive(Debug, Clone, Default)]
pub struct AutoDecoder {
    wav: WavDecoder,
    compressed: SymphoniaDecoder,
}

impl AutoDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Passes a file-extension hint (e.g. `"mp3"`) to the compressed decoder's probe.
    pub fn with_extension_hint(extension: impl Into<String>) -> Self {
        Self {
            wav: WavDecoder,
            compressed: SymphoniaDecoder::with_extension_hint(extension),
        }
    }
}

impl Decoder for AutoDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<SampleBuffer> {
        if is_riff_wave(bytes) {
            self.wav.decode(bytes)
        } else {
            self.compressed.decode(bytes)
        }
    }
}

fn is_riff_wave(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}
