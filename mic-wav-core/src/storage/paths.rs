//! Artifact naming.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;

/// Generate a unique artifact path inside `dir`, creating the directory.
///
/// Format: `rec_<unix millis>_<uuid>.wav`
pub fn generate_wav_path(dir: &Path) -> Result<PathBuf, CaptureError> {
    fs::create_dir_all(dir).map_err(|e| CaptureError::io("failed to create recording directory", e))?;
    let millis = chrono::Utc::now().timestamp_millis();
    let id = uuid::Uuid::new_v4().simple();
    Ok(dir.join(format!("rec_{}_{}.wav", millis, id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_unique_wav_files_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let recordings = dir.path().join("recordings");

        let first = generate_wav_path(&recordings).unwrap();
        let second = generate_wav_path(&recordings).unwrap();

        assert!(recordings.is_dir());
        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(recordings.as_path()));
        assert_eq!(first.extension().and_then(|e| e.to_str()), Some("wav"));
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("rec_"));
    }
}
