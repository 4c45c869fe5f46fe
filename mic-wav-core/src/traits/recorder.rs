use std::path::PathBuf;

use crate::models::error::CaptureError;
use crate::models::state::RecorderState;

/// The recorder contract consumed by UI and upload collaborators.
///
/// One `start`, one `stop`. Collaborators hold a `Box<dyn AudioRecorder>` and
/// never need to know which input backs it.
pub trait AudioRecorder: Send {
    fn state(&self) -> RecorderState;

    fn is_recording(&self) -> bool {
        self.state().is_recording()
    }

    /// Begin capturing into a new artifact at `path`.
    fn start(&mut self, path: PathBuf) -> Result<(), CaptureError>;

    /// End capture and return the finalized artifact's path.
    fn stop(&mut self) -> Result<PathBuf, CaptureError>;
}
