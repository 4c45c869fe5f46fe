pub mod audio_input;
pub mod recorder;
pub mod recorder_delegate;
