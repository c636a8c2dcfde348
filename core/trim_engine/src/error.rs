use thiserror::Error;

use crate::output::OutputError;

/// Errors surfaced by the engine to its host.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Input bytes are not a recognised audio encoding, or are truncated.
    #[error("Failed to decode audio: {0}")]
    DecodeFailed(String),

    /// Export requested on an empty or inverted range.
    #[error("Invalid export range: {start}s..{end}s")]
    InvalidRange { start: f64, end: f64 },

    /// The range is too long for a RIFF container.
    #[error("Export of {bytes} bytes exceeds the WAV size limit")]
    ExportTooLarge { bytes: u64 },

    #[error("No audio loaded")]
    NoAsset,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Output(#[from] OutputError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
