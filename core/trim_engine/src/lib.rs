pub mod buffer;
pub mod config;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod export;
pub mod output;
pub mod playback;
pub mod selection;
pub mod session;
pub mod waveform;
