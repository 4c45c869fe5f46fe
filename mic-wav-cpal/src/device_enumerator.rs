//! Input device enumeration via the CPAL default host.

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

use mic_wav_core::models::audio_models::InputDeviceInfo;
use mic_wav_core::models::error::CaptureError;

/// Audio input enumerator over the platform's default CPAL host.
pub struct DeviceEnumerator {
    host: Host,
}

impl DeviceEnumerator {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// List input devices with their names.
    pub fn list_input_devices(&self) -> Result<Vec<InputDeviceInfo>, CaptureError> {
        let default_name = self.default_input_name();
        let devices = self
            .host
            .input_devices()
            .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to enumerate inputs: {}", e)))?;

        let mut sources = Vec::new();
        for device in devices {
            let Ok(name) = device.name() else {
                continue;
            };
            sources.push(InputDeviceInfo {
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
            });
        }
        Ok(sources)
    }

    /// Name of the system default input, if one exists.
    pub fn default_input_name(&self) -> Option<String> {
        self.host.default_input_device().and_then(|d| d.name().ok())
    }

    /// Resolve `name` to a device, or the default input when `name` is None.
    pub fn resolve(&self, name: Option<&str>) -> Result<Device, CaptureError> {
        match name {
            Some(name) => {
                let mut devices = self
                    .host
                    .input_devices()
                    .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to enumerate inputs: {}", e)))?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| CaptureError::DeviceUnavailable(format!("input device '{}' not found", name)))
            }
            None => self
                .host
                .default_input_device()
                .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device available".into())),
        }
    }
}

impl Default for DeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}
