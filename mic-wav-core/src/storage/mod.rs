pub mod metadata;
pub mod paths;
pub mod wav_writer;
