//! Microphone access probe.
//!
//! Neither Linux nor Windows desktop apps get a consent dialog; a denied or
//! busy microphone only shows up when a stream is opened. On macOS the first
//! open is what triggers the system prompt. Run this before `start()` to
//! report a missing permission instead of a generic open failure.

use cpal::traits::DeviceTrait;

use mic_wav_core::models::audio_models::PcmFormat;
use mic_wav_core::models::error::CaptureError;
use mic_wav_core::traits::audio_input::{AudioInput, InputHandle};

use crate::cpal_input::CpalInput;
use crate::device_enumerator::DeviceEnumerator;

const PROBE_BUFFER_FRAMES: usize = 2048;

/// Check whether the named input (or the default one) can be opened.
///
/// The probe opens a stream at the device's default rate and releases it
/// immediately. `Ok(false)` means there is no such device or access is refused.
pub fn check_microphone_access(device_name: Option<&str>) -> Result<bool, CaptureError> {
    let device = match DeviceEnumerator::new().resolve(device_name) {
        Ok(device) => device,
        Err(e) => {
            log::warn!("Microphone not found: {}", e);
            return Ok(false);
        }
    };

    let default_config = match device.default_input_config() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Microphone not accessible: {}", e);
            return Ok(false);
        }
    };

    let input = match device_name {
        Some(name) => CpalInput::with_device_name(name),
        None => CpalInput::default_device(),
    };
    let format = PcmFormat::mono_16bit(default_config.sample_rate().0);
    match input.open(&format, PROBE_BUFFER_FRAMES) {
        Ok(handle) => {
            handle.release();
            Ok(true)
        }
        Err(e) => {
            log::warn!("Microphone could not be opened: {}", e);
            Ok(false)
        }
    }
}

/// Like `check_microphone_access`, but an inaccessible microphone is an error.
pub fn ensure_input_available(device_name: Option<&str>) -> Result<(), CaptureError> {
    if check_microphone_access(device_name)? {
        Ok(())
    } else {
        Err(CaptureError::DeviceUnavailable(
            "microphone missing or access denied".into(),
        ))
    }
}
