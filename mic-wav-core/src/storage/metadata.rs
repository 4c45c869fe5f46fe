use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};

/// Sidecar location for a recording: the extension is replaced, so
/// `rec.wav` maps to `rec.metadata.json`.
pub fn metadata_path(recording_path: &Path) -> PathBuf {
    recording_path.with_extension("metadata.json")
}

/// Checksum the finalized artifact and write its JSON sidecar.
pub fn write_metadata(result: &RecordingResult) -> Result<RecordingMetadata, CaptureError> {
    let checksum = sha256_file(&result.file_path)?;
    let metadata = RecordingMetadata::new(result, &checksum);
    let json = serde_json::to_string_pretty(&metadata)
        .map_err(|e| CaptureError::IoError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(&result.file_path), json).map_err(|e| CaptureError::io("failed to write metadata", e))?;
    Ok(metadata)
}

/// Read recording metadata from a JSON sidecar file.
pub fn read_metadata(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let json = fs::read_to_string(metadata_path(recording_path))
        .map_err(|e| CaptureError::io("failed to read metadata", e))?;
    let metadata: RecordingMetadata = serde_json::from_str(&json)
        .map_err(|e| CaptureError::IoError(format!("failed to parse metadata: {}", e)))?;
    Ok(metadata)
}

/// Compute SHA-256 hex digest of a file, streaming it through the hasher.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let mut file = File::open(path).map_err(|e| CaptureError::io("failed to open file for checksum", e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| CaptureError::io("failed to read file for checksum", e))?;
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::PcmFormat;

    #[test]
    fn sidecar_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rec.wav");
        fs::write(&path, b"abc").unwrap();

        let result = RecordingResult::new(path.clone(), 32_000, PcmFormat::mono_16bit(16_000));
        let written = write_metadata(&result).unwrap();

        assert!(dir.path().join("rec.metadata.json").exists());
        assert_eq!(
            written.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(written.recording_path(), path.as_path());
        assert_eq!(written.duration_secs, 1.0);

        let read = read_metadata(&path).unwrap();
        assert_eq!(read, written);
    }

    #[test]
    fn checksum_streams_files_larger_than_one_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.wav");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        assert_eq!(sha256_file(&path).unwrap(), hex_encode(&Sha256::digest(&data)));
    }

    #[test]
    fn checksum_of_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            sha256_file(&dir.path().join("absent.wav")),
            Err(CaptureError::IoError(_))
        ));
    }

    #[test]
    fn sidecar_stores_rfc3339_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stamp.wav");
        fs::write(&path, [0u8; 44]).unwrap();

        let written = write_metadata(&RecordingResult::new(path.clone(), 0, PcmFormat::default())).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(metadata_path(&path)).unwrap()).unwrap();
        let stamp = json["created_at"].as_str().unwrap();

        let parsed = chrono::DateTime::parse_from_rfc3339(stamp).unwrap();
        assert_eq!(parsed, written.created_at);
    }

    #[test]
    fn missing_sidecar_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_metadata(&dir.path().join("none.wav")).unwrap_err();
        assert!(matches!(err, CaptureError::IoError(_)));
    }
}
