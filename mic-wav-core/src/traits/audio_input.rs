use crate::models::audio_models::PcmFormat;
use crate::models::error::CaptureError;

/// A platform audio input that can be opened for blocking reads.
///
/// Implemented by:
/// - `CpalInput` (mic-wav-cpal)
/// - scripted inputs in tests
pub trait AudioInput: Send + Sync {
    type Handle: InputHandle;

    /// Whether an input device is present at all.
    fn is_available(&self) -> bool;

    /// Human-readable name of the device this input opens.
    fn device_name(&self) -> String;

    /// Smallest buffer, in frames, the device accepts for `format`, if it reports one.
    fn min_buffer_frames(&self, format: &PcmFormat) -> Option<usize>;

    /// Open the device exclusively for capture.
    ///
    /// Fails with `CaptureError::DeviceUnavailable` when permission is denied,
    /// the device is busy, or `format` cannot be captured natively.
    fn open(&self, format: &PcmFormat, buffer_frames: usize) -> Result<Self::Handle, CaptureError>;
}

/// An open, exclusively owned input device.
///
/// Dropping a handle must release the device just like `release`.
pub trait InputHandle: Send + 'static {
    /// Read mono samples into `buf`.
    ///
    /// Blocks until at least one sample is available or the backend's read
    /// timeout elapses. `Ok(0)` is a normal empty poll, not end of stream.
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError>;

    /// Stop the device and free it.
    fn release(self);
}
