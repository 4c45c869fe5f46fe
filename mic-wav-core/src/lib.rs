//! # mic-wav-core
//!
//! Platform-agnostic microphone capture core.
//!
//! Drains a blocking audio input on a dedicated thread into a WAV artifact
//! whose 44-byte header is reserved up front and patched in place once the
//! payload size is known. Platform backends implement `AudioInput` and plug
//! into the generic `PcmWavRecorder`.
//!
//! ## Architecture
//!
//! ```text
//! mic-wav-core (this crate)
//! ├── traits/       ← AudioInput, InputHandle, AudioRecorder, RecorderDelegate
//! ├── models/       ← CaptureError, RecorderState, RecorderConfig, PcmFormat, results
//! ├── processing/   ← WAV header generation/parsing, RingBuffer, BlockingSampleQueue
//! ├── session/      ← PcmWavRecorder (capture loop + start/stop state machine)
//! └── storage/      ← WavWriter, artifact finalization, metadata sidecar, paths
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{InputDeviceInfo, PcmFormat, MAX_SAMPLE_RATE};
pub use models::config::RecorderConfig;
pub use models::error::CaptureError;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::RecorderState;
pub use processing::ring_buffer::{BlockingSampleQueue, RingBuffer};
pub use processing::wav_format::{write_header, ParsedHeader, MAX_DATA_BYTES, WAV_HEADER_SIZE};
pub use session::recorder::PcmWavRecorder;
pub use storage::wav_writer::{discard_artifact, encode_wav, finalize_artifact, inspect_artifact, DurableStream, WavWriter};
pub use traits::audio_input::{AudioInput, InputHandle};
pub use traits::recorder::AudioRecorder;
pub use traits::recorder_delegate::RecorderDelegate;
