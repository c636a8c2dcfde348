use thiserror::Error;

use crate::buffer::SampleBuffer;

pub mod cpal_output;
pub mod resample;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputError {
    #[error("No audio output device found")]
    DeviceNotFound,

    #[error("Failed to build output stream: {0}")]
    StreamBuildFailed(String),

    #[error("Failed to start output stream: {0}")]
    StreamStartFailed(String),

    /// The source already ran to completion or was stopped before.
    #[error("Sounding source already stopped")]
    AlreadyStopped,
}

/// A buffer currently sounding on an output.
pub trait SoundingSource {
    /// Halts the source. A source that already finished on its own answers
    /// [`OutputError::AlreadyStopped`].
    fn stop(&mut self) -> Result<(), OutputError>;
}

/// The audio output context of one editing session.
///
/// The context is acquired on the first [`AudioOutput::start`] and held until
/// [`AudioOutput::close`]; closing an unopened or already closed context is a no-op.
pub trait AudioOutput {
    fn start(
        &mut self,
        buffer: &SampleBuffer,
        offset_seconds: f64,
    ) -> Result<Box<dyn SoundingSource>, OutputError>;

    fn close(&mut self);
}
