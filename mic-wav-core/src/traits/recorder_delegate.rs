use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::RecorderState;

/// Event delegate for recorder notifications.
///
/// Methods are called on the thread that drives `start`/`stop`.
pub trait RecorderDelegate: Send + Sync {
    fn on_state_changed(&self, state: RecorderState);

    /// Called when a session ends in an error, including errors that still
    /// produced an artifact.
    fn on_error(&self, error: &CaptureError);

    /// Called after the artifact has been finalized.
    fn on_capture_finished(&self, result: &RecordingResult);
}
