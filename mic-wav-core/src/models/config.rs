use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::audio_models::PcmFormat;
use super::error::CaptureError;
use crate::processing::wav_format::MAX_DATA_BYTES;

/// Configuration for a recorder instance.
///
/// Every field has a default, so a JSON document only needs to name the
/// fields it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Capture sample rate in Hz (default: 16000). Fixed for a session.
    pub sample_rate: u32,

    /// Lower bound for the drain buffer, in frames (default: 2048). The
    /// effective size is the larger of this and the device-reported minimum.
    pub min_buffer_frames: usize,

    /// How long `stop()` waits for the drain thread to exit (default: 400ms).
    pub join_timeout_ms: u64,

    /// Maximum PCM payload per artifact. Capture ends once it is reached.
    /// Cannot exceed what the 32-bit RIFF size fields can carry.
    pub max_data_bytes: u32,

    /// Write a `<recording>.metadata.json` sidecar after finalization.
    pub write_metadata: bool,

    /// Input device to open, or None for the system default.
    pub device_name: Option<String>,
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.format().validate()?;
        if self.min_buffer_frames == 0 {
            return Err("min_buffer_frames must be positive".into());
        }
        if self.join_timeout_ms == 0 {
            return Err("join_timeout_ms must be positive".into());
        }
        if self.max_data_bytes > MAX_DATA_BYTES {
            return Err(format!(
                "max_data_bytes {} exceeds the WAV size ceiling of {} bytes",
                self.max_data_bytes, MAX_DATA_BYTES
            ));
        }
        Ok(())
    }

    pub fn format(&self) -> PcmFormat {
        PcmFormat::mono_16bit(self.sample_rate)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CaptureError::ConfigurationFailed(format!("invalid config: {}", e)))?;
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CaptureError> {
        let json = fs::read_to_string(path).map_err(|e| CaptureError::io("failed to read config", e))?;
        Self::from_json_str(&json)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            min_buffer_frames: 2048,
            join_timeout_ms: 400,
            max_data_bytes: MAX_DATA_BYTES,
            write_metadata: false,
            device_name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RecorderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.format(), PcmFormat::mono_16bit(16_000));
        assert_eq!(config.join_timeout(), Duration::from_millis(400));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            RecorderConfig::from_json_str(r#"{ "sample_rate": 48000, "write_metadata": true }"#).unwrap();
        assert_eq!(config.sample_rate, 48_000);
        assert!(config.write_metadata);
        assert_eq!(config.min_buffer_frames, 2048);
        assert_eq!(config.max_data_bytes, MAX_DATA_BYTES);
    }

    #[test]
    fn json_with_invalid_values_is_rejected() {
        let err = RecorderConfig::from_json_str(r#"{ "sample_rate": 0 }"#).unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));

        let err = RecorderConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recorder.json");
        fs::write(&path, r#"{ "join_timeout_ms": 250, "device_name": "USB Mic" }"#).unwrap();

        let config = RecorderConfig::from_json_file(&path).unwrap();
        assert_eq!(config.join_timeout_ms, 250);
        assert_eq!(config.device_name.as_deref(), Some("USB Mic"));

        let missing = RecorderConfig::from_json_file(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(CaptureError::IoError(_))));
    }

    #[test]
    fn zero_buffer_floor_is_rejected() {
        let config = RecorderConfig {
            min_buffer_frames: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
