//! # mic-wav-cpal
//!
//! CPAL microphone backend for mic-wav-core.
//!
//! Provides:
//! - `CpalInput` / `CpalHandle`: microphone capture through the default CPAL host
//! - `DeviceEnumerator`: input device listing and lookup by name
//! - `permissions`: microphone access probe to run before recording
//!
//! ## Platform Requirements
//! - Linux: ALSA development headers (`libasound2-dev`)
//! - Windows: WASAPI, no extra setup
//! - macOS: CoreAudio, plus the microphone usage entitlement for bundled apps
//!
//! ## Usage
//! ```ignore
//! use mic_wav_core::{PcmWavRecorder, RecorderConfig};
//! use mic_wav_cpal::{permissions, CpalInput};
//!
//! let config = RecorderConfig::default();
//! permissions::ensure_input_available(config.device_name.as_deref())?;
//! let mut recorder = PcmWavRecorder::new(CpalInput::from_config(&config), config)?;
//! recorder.start("take.wav")?;
//! // ...
//! let path = recorder.stop()?;
//! ```

pub mod cpal_input;
pub mod device_enumerator;
pub mod permissions;

pub use cpal_input::{CpalHandle, CpalInput};
pub use device_enumerator::DeviceEnumerator;
