use serde::{Deserialize, Serialize};

/// Highest sample rate a recording may use.
pub const MAX_SAMPLE_RATE: u32 = 384_000;

/// PCM layout of a capture session.
///
/// Only mono 16-bit linear PCM is produced; `validate` rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl PcmFormat {
    pub const fn mono_16bit(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
            bits_per_sample: 16,
        }
    }

    /// Bytes per frame (all channels of one sample instant).
    pub fn block_align(&self) -> u16 {
        (self.channels as u32 * self.bits_per_sample as u32 / 8) as u16
    }

    /// Bytes per second of audio.
    pub fn byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.channels as u64 * self.bits_per_sample as u64 / 8
    }

    /// Seconds of audio represented by `pcm_bytes` bytes of payload.
    pub fn duration_secs(&self, pcm_bytes: u64) -> f64 {
        let byte_rate = self.byte_rate();
        if byte_rate == 0 {
            return 0.0;
        }
        pcm_bytes as f64 / byte_rate as f64
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.sample_rate > MAX_SAMPLE_RATE {
            return Err(format!(
                "sample rate {} Hz exceeds the {} Hz maximum",
                self.sample_rate, MAX_SAMPLE_RATE
            ));
        }
        if self.channels != 1 {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if self.bits_per_sample != 16 {
            return Err(format!("unsupported bit depth: {}", self.bits_per_sample));
        }
        Ok(())
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::mono_16bit(16_000)
    }
}

/// An input device a backend can open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeviceInfo {
    pub name: String,
    pub is_default: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mono_16bit_derived_fields() {
        let format = PcmFormat::mono_16bit(16_000);
        assert_eq!(format.block_align(), 2);
        assert_eq!(format.byte_rate(), 32_000);
    }

    #[test]
    fn duration_from_byte_count() {
        let format = PcmFormat::mono_16bit(16_000);
        assert_relative_eq!(format.duration_secs(32_000), 1.0);
        assert_relative_eq!(format.duration_secs(12_288), 0.384);
        assert_relative_eq!(format.duration_secs(0), 0.0);
    }

    #[test]
    fn validate_rejects_stereo_and_other_depths() {
        assert!(PcmFormat::mono_16bit(44_100).validate().is_ok());
        assert!(PcmFormat::mono_16bit(0).validate().is_err());

        let stereo = PcmFormat {
            channels: 2,
            ..PcmFormat::default()
        };
        assert!(stereo.validate().is_err());

        let float = PcmFormat {
            bits_per_sample: 32,
            ..PcmFormat::default()
        };
        assert!(float.validate().is_err());
    }

    #[test]
    fn validate_caps_sample_rate() {
        assert!(PcmFormat::mono_16bit(MAX_SAMPLE_RATE).validate().is_ok());
        assert!(PcmFormat::mono_16bit(MAX_SAMPLE_RATE + 1).validate().is_err());
        assert!(PcmFormat::mono_16bit(300_000_000).validate().is_err());
    }

    #[test]
    fn byte_rate_does_not_overflow() {
        let format = PcmFormat::mono_16bit(u32::MAX);
        assert_eq!(format.byte_rate(), u32::MAX as u64 * 2);
    }
}
