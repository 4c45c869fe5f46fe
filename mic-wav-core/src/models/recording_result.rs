use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::audio_models::PcmFormat;

/// Summary of a finalized recording, handed to the delegate on completion.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub pcm_bytes: u64,
    pub duration_secs: f64,
    pub format: PcmFormat,
}

impl RecordingResult {
    pub fn new(file_path: PathBuf, pcm_bytes: u64, format: PcmFormat) -> Self {
        Self {
            file_path,
            pcm_bytes,
            duration_secs: format.duration_secs(pcm_bytes),
            format,
        }
    }

    /// Total artifact size: header plus payload.
    pub fn file_len(&self) -> u64 {
        crate::processing::wav_format::WAV_HEADER_SIZE as u64 + self.pcm_bytes
    }
}

/// Metadata stored in a JSON sidecar next to the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub file_path: String,
    pub pcm_bytes: u64,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

impl RecordingMetadata {
    pub fn new(result: &RecordingResult, checksum: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: result.file_path.to_string_lossy().into_owned(),
            pcm_bytes: result.pcm_bytes,
            duration_secs: result.duration_secs,
            sample_rate: result.format.sample_rate,
            channels: result.format.channels,
            bits_per_sample: result.format.bits_per_sample,
            checksum: checksum.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn recording_path(&self) -> &Path {
        Path::new(&self.file_path)
    }
}
