pub mod clock;
pub mod poll;
pub mod timecode;
