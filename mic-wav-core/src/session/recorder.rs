use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};

use crate::models::audio_models::PcmFormat;
use crate::models::config::RecorderConfig;
use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::RecorderState;
use crate::processing::wav_format::{self, WAV_HEADER_SIZE};
use crate::storage::metadata;
use crate::storage::paths::generate_wav_path;
use crate::storage::wav_writer::{self, DurableStream, WavWriter};
use crate::traits::audio_input::{AudioInput, InputHandle};
use crate::traits::recorder::AudioRecorder;
use crate::traits::recorder_delegate::RecorderDelegate;

/// Clears the recorder's device-in-use flag when dropped.
struct DeviceLease(Arc<AtomicBool>);

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handed back by the drain thread when it exits.
///
/// Field order is drop order: if nobody receives the outcome, the device
/// handle is freed before the lease clears.
struct DrainOutcome<H: InputHandle> {
    handle: H,
    pcm_bytes: u64,
    failure: Option<CaptureError>,
    lease: DeviceLease,
}

/// The producer side of a session: drains the device into the artifact.
struct DrainLoop {
    running: Arc<AtomicBool>,
    progress: Arc<AtomicU64>,
    buffer_frames: usize,
    max_data_bytes: u64,
    block_align: u64,
}

impl DrainLoop {
    fn run<H: InputHandle, W: DurableStream>(
        self,
        mut handle: H,
        mut writer: WavWriter<W>,
        lease: DeviceLease,
    ) -> DrainOutcome<H> {
        let mut samples = vec![0i16; self.buffer_frames];
        let mut bytes = Vec::with_capacity(self.buffer_frames * 2);
        let mut failure = None;

        while self.running.load(Ordering::Acquire) {
            let read = match handle.read(&mut samples) {
                Ok(0) => continue,
                Ok(read) => read.min(samples.len()),
                Err(e) => {
                    log::error!("Device read failed: {}", e);
                    failure = Some(e);
                    break;
                }
            };

            bytes.clear();
            wav_format::samples_to_le_bytes(&samples[..read], &mut bytes);

            let room = self.max_data_bytes - writer.pcm_bytes();
            let room = room - room % self.block_align;
            let take = (bytes.len() as u64).min(room) as usize;

            if let Err(e) = writer.append(&bytes[..take]) {
                log::error!("Failed to write audio data: {}", e);
                failure = Some(e);
                break;
            }
            self.progress.store(writer.pcm_bytes(), Ordering::Relaxed);

            if take < bytes.len() {
                log::warn!(
                    "Size ceiling of {} bytes reached, capture loop exiting",
                    self.max_data_bytes
                );
                break;
            }
        }

        // The PCM stream is always flushed before the loop hands back control.
        let counted = writer.pcm_bytes();
        let pcm_bytes = match writer.close() {
            Ok(pcm_bytes) => pcm_bytes,
            Err(e) => {
                log::error!("Failed to close pcm stream: {}", e);
                failure.get_or_insert(e);
                counted
            }
        };

        DrainOutcome {
            handle,
            pcm_bytes,
            failure,
            lease,
        }
    }
}

/// One start/stop cycle.
struct CaptureSession<H: InputHandle> {
    path: PathBuf,
    format: PcmFormat,
    running: Arc<AtomicBool>,
    started_at: Instant,
    done_rx: Receiver<DrainOutcome<H>>,
    thread: thread::JoinHandle<()>,
}

/// Microphone recorder producing mono 16-bit PCM WAV artifacts.
///
/// Generic over the input backend via `AudioInput`. Data flow:
/// ```text
/// [InputHandle::read] → [drain thread] → [WavWriter: placeholder + PCM]
///                                               ↓ stop()
///                                  [finalize_artifact: header patched in place]
/// ```
///
/// The running flag is the only datum shared with the drain thread. `stop()`
/// waits for the thread's outcome before touching the header, so no PCM
/// bytes are in flight when the header is written.
pub struct PcmWavRecorder<I: AudioInput> {
    input: I,
    config: RecorderConfig,
    state: RecorderState,
    delegate: Option<Arc<dyn RecorderDelegate>>,
    session: Option<CaptureSession<I::Handle>>,
    progress: Arc<AtomicU64>,
    device_in_use: Arc<AtomicBool>,
}

impl<I: AudioInput> PcmWavRecorder<I> {
    pub fn new(input: I, config: RecorderConfig) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(Self {
            input,
            config,
            state: RecorderState::Idle,
            delegate: None,
            session: None,
            progress: Arc::new(AtomicU64::new(0)),
            device_in_use: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RecorderDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    /// PCM bytes written by the current (or last) session so far.
    pub fn recorded_bytes(&self) -> u64 {
        self.progress.load(Ordering::Relaxed)
    }

    /// Wall-clock time since the active session started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.session.as_ref().map(|s| s.started_at.elapsed())
    }

    /// Whether a device handle is still held, possibly by a drain thread
    /// detached after a timed-out `stop()`.
    pub fn device_in_use(&self) -> bool {
        self.device_in_use.load(Ordering::Acquire)
    }

    /// Start capturing into a new artifact at `path`.
    ///
    /// Transitions: idle → recording. Rejected with `AlreadyRecording` while a
    /// session is active or its device has not been released yet.
    pub fn start(&mut self, path: impl Into<PathBuf>) -> Result<(), CaptureError> {
        if self.session.is_some() || self.device_in_use() {
            return Err(CaptureError::AlreadyRecording);
        }

        let path = path.into();
        let format = self.config.format();
        let buffer_frames = self
            .input
            .min_buffer_frames(&format)
            .unwrap_or(0)
            .max(self.config.min_buffer_frames);

        // Open the device before touching storage so a refused open leaves no artifact.
        let handle = self.input.open(&format, buffer_frames)?;

        let writer = match WavWriter::create(&path) {
            Ok(writer) => writer,
            Err(e) => {
                handle.release();
                return Err(e);
            }
        };

        self.device_in_use.store(true, Ordering::Release);
        let lease = DeviceLease(Arc::clone(&self.device_in_use));
        self.progress.store(0, Ordering::Relaxed);

        let running = Arc::new(AtomicBool::new(true));
        let drain = DrainLoop {
            running: Arc::clone(&running),
            progress: Arc::clone(&self.progress),
            buffer_frames,
            max_data_bytes: self.config.max_data_bytes as u64,
            block_align: format.block_align() as u64,
        };
        let (done_tx, done_rx) = bounded(1);

        let spawned = thread::Builder::new().name("wav-drain".into()).spawn(move || {
            let outcome = drain.run(handle, writer, lease);
            if done_tx.send(outcome).is_err() {
                log::warn!("Capture loop exited after stop() stopped waiting; device released");
            }
        });

        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                if let Err(discard_err) = wav_writer::discard_artifact(&path) {
                    log::warn!("Failed to remove placeholder {:?}: {}", path, discard_err);
                }
                return Err(CaptureError::io("failed to spawn capture thread", e));
            }
        };

        log::info!(
            "Recording started: {:?} ({} Hz, {} frame buffer, device {})",
            path,
            format.sample_rate,
            buffer_frames,
            self.input.device_name()
        );

        self.session = Some(CaptureSession {
            path,
            format,
            running,
            started_at: Instant::now(),
            done_rx,
            thread,
        });
        self.set_state(RecorderState::Recording);
        Ok(())
    }

    /// Start capturing into a freshly named artifact inside `dir`.
    pub fn start_in(&mut self, dir: &Path) -> Result<PathBuf, CaptureError> {
        if self.session.is_some() || self.device_in_use() {
            return Err(CaptureError::AlreadyRecording);
        }
        let path = generate_wav_path(dir)?;
        self.start(path.clone())?;
        Ok(path)
    }

    /// Stop capture, finalize the artifact, and return its path.
    ///
    /// Transitions: recording → finalizing → idle.
    pub fn stop(&mut self) -> Result<PathBuf, CaptureError> {
        let session = self.session.take().ok_or(CaptureError::NoActiveSession)?;
        self.set_state(RecorderState::Finalizing);

        session.running.store(false, Ordering::Release);

        let timeout = self.config.join_timeout();
        let outcome = match session.done_rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                // Detach: the thread exits on its next flag check and frees the
                // device itself. Patching now would race with in-flight PCM.
                log::warn!(
                    "Capture loop did not exit within {:?}; {:?} left unfinalized",
                    timeout,
                    session.path
                );
                return Err(self.fail(CaptureError::Timeout));
            }
            Err(RecvTimeoutError::Disconnected) => {
                if session.thread.join().is_err() {
                    log::error!("Capture thread panicked");
                }
                return Err(self.fail(CaptureError::DeviceReadError(
                    "capture loop terminated unexpectedly".into(),
                )));
            }
        };

        if session.thread.join().is_err() {
            log::error!("Capture thread panicked after handing back its outcome");
        }

        let DrainOutcome {
            handle,
            pcm_bytes,
            failure,
            lease,
        } = outcome;
        handle.release();
        drop(lease);

        self.finalize_session(session.path, session.format, pcm_bytes, failure)
    }

    // --- Internal helpers ---

    fn finalize_session(
        &mut self,
        path: PathBuf,
        format: PcmFormat,
        pcm_bytes: u64,
        failure: Option<CaptureError>,
    ) -> Result<PathBuf, CaptureError> {
        // After a failed append or flush the counter and the file disagree;
        // the header describes the whole frames that actually reached disk.
        let pcm_bytes = if failure.is_some() {
            on_disk_pcm_bytes(&path, format.block_align() as u64)
        } else {
            pcm_bytes
        };

        let header = wav_format::write_header(
            format.sample_rate,
            format.channels,
            format.bits_per_sample,
            pcm_bytes,
        );
        if let Err(e) = wav_writer::finalize_artifact(&path, &header) {
            if let Some(ref cause) = failure {
                log::error!("Capture failed before finalization: {}", cause);
            }
            log::error!("Failed to finalize {:?}: {}", path, e);
            return Err(self.fail(e));
        }

        let result = RecordingResult::new(path.clone(), pcm_bytes, format);
        if self.config.write_metadata {
            if let Err(e) = metadata::write_metadata(&result) {
                log::error!("Failed to write metadata for {:?}: {}", path, e);
                self.report_error(&e);
            }
        }

        match failure {
            Some(cause) => {
                let err = CaptureError::CaptureInterrupted {
                    path,
                    pcm_bytes,
                    cause: Box::new(cause),
                };
                Err(self.fail(err))
            }
            None => {
                log::info!("Recording finalized: {:?} ({} PCM bytes)", path, pcm_bytes);
                self.set_state(RecorderState::Idle);
                if let Some(ref delegate) = self.delegate {
                    delegate.on_capture_finished(&result);
                }
                Ok(path)
            }
        }
    }

    fn fail(&mut self, error: CaptureError) -> CaptureError {
        self.set_state(RecorderState::Idle);
        self.report_error(&error);
        error
    }

    fn report_error(&self, error: &CaptureError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }

    fn set_state(&mut self, new_state: RecorderState) {
        self.state = new_state;
        log::debug!("Recorder state: {}", new_state.label());
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(new_state);
        }
    }
}

impl<I: AudioInput> AudioRecorder for PcmWavRecorder<I> {
    fn state(&self) -> RecorderState {
        self.state
    }

    fn start(&mut self, path: PathBuf) -> Result<(), CaptureError> {
        PcmWavRecorder::start(self, path)
    }

    fn stop(&mut self) -> Result<PathBuf, CaptureError> {
        PcmWavRecorder::stop(self)
    }
}

impl<I: AudioInput> Drop for PcmWavRecorder<I> {
    fn drop(&mut self) {
        if self.session.is_none() {
            return;
        }
        match self.stop() {
            Ok(path) => log::warn!("Recorder dropped while recording; finalized {:?}", path),
            Err(e) => log::error!("Recorder dropped while recording: {}", e),
        }
    }
}

/// Whole frames of payload actually present on disk.
fn on_disk_pcm_bytes(path: &Path, block_align: u64) -> u64 {
    let len = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let payload = len.saturating_sub(WAV_HEADER_SIZE as u64);
    payload - payload % block_align.max(1)
}
