//! CPAL microphone input.
//!
//! CPAL is callback-driven while the recorder's drain loop reads in a
//! blocking fashion. The stream callback converts every buffer to mono
//! 16-bit samples and pushes them into a `BlockingSampleQueue`; the drain
//! loop pulls from the queue through `CpalHandle::read`.
//!
//! `cpal::Stream` is not `Send` on every host, so the stream is built, played
//! and dropped on a dedicated keeper thread that lives as long as the handle.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{
    BufferSize, Device, FromSample, Sample, SampleFormat, SampleRate, SizedSample, Stream,
    StreamConfig, StreamError, SupportedBufferSize,
};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;

use mic_wav_core::models::audio_models::{InputDeviceInfo, PcmFormat};
use mic_wav_core::models::config::RecorderConfig;
use mic_wav_core::models::error::CaptureError;
use mic_wav_core::processing::ring_buffer::BlockingSampleQueue;
use mic_wav_core::processing::wav_format::{downmix_to_mono, f32_to_i16};
use mic_wav_core::traits::audio_input::{AudioInput, InputHandle};

use crate::device_enumerator::DeviceEnumerator;

/// How long `CpalHandle::read` waits for samples before reporting an empty poll.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// How long `open` waits for the keeper thread to report the stream state.
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Queue capacity in units of the requested buffer size.
const QUEUE_BUFFERS: usize = 16;

/// Microphone capture through the platform's default CPAL host.
pub struct CpalInput {
    device_name: Option<String>,
}

impl CpalInput {
    /// Capture from the system default input device.
    pub fn default_device() -> Self {
        Self { device_name: None }
    }

    /// Capture from the input device whose CPAL name equals `name`.
    pub fn with_device_name(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    /// Honor `RecorderConfig::device_name`, falling back to the default input.
    pub fn from_config(config: &RecorderConfig) -> Self {
        match &config.device_name {
            Some(name) => Self::with_device_name(name.clone()),
            None => Self::default_device(),
        }
    }

    /// List the input devices of the default host.
    pub fn list_devices() -> Result<Vec<InputDeviceInfo>, CaptureError> {
        DeviceEnumerator::new().list_input_devices()
    }
}

impl AudioInput for CpalInput {
    type Handle = CpalHandle;

    fn is_available(&self) -> bool {
        DeviceEnumerator::new()
            .resolve(self.device_name.as_deref())
            .is_ok()
    }

    fn device_name(&self) -> String {
        match &self.device_name {
            Some(name) => name.clone(),
            None => DeviceEnumerator::new()
                .default_input_name()
                .unwrap_or_else(|| "Default Microphone".into()),
        }
    }

    fn min_buffer_frames(&self, format: &PcmFormat) -> Option<usize> {
        let device = DeviceEnumerator::new()
            .resolve(self.device_name.as_deref())
            .ok()?;
        let rate = SampleRate(format.sample_rate);
        device
            .supported_input_configs()
            .ok()?
            .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
            .filter_map(|range| match range.buffer_size() {
                SupportedBufferSize::Range { min, .. } => Some(*min as usize),
                SupportedBufferSize::Unknown => None,
            })
            .min()
    }

    fn open(&self, format: &PcmFormat, buffer_frames: usize) -> Result<CpalHandle, CaptureError> {
        format.validate().map_err(CaptureError::ConfigurationFailed)?;

        let queue = Arc::new(BlockingSampleQueue::new(
            buffer_frames.max(1) * QUEUE_BUFFERS,
        ));
        let fault = Arc::new(Mutex::new(None));
        let (status_tx, status_rx) = bounded::<Result<(), CaptureError>>(1);
        let (release_tx, release_rx) = bounded::<()>(1);

        let device_name = self.device_name.clone();
        let sample_rate = format.sample_rate;
        let stream_queue = Arc::clone(&queue);
        let stream_fault = Arc::clone(&fault);

        let keeper = thread::Builder::new()
            .name("cpal-input".into())
            .spawn(move || {
                let stream = match open_stream(
                    device_name.as_deref(),
                    sample_rate,
                    stream_queue,
                    stream_fault,
                ) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = status_tx.send(Err(e));
                        return;
                    }
                };
                let _ = status_tx.send(Ok(()));

                // Park until released. A dropped sender ends the wait too.
                let _ = release_rx.recv();
                if let Err(e) = stream.pause() {
                    log::debug!("Pausing input stream failed: {}", e);
                }
                drop(stream);
                log::debug!("Input stream closed");
            })
            .map_err(|e| {
                CaptureError::DeviceUnavailable(format!("failed to spawn input thread: {}", e))
            })?;

        match status_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(())) => {
                log::info!(
                    "Opened input '{}' at {} Hz, buffer {} frames",
                    self.device_name(),
                    sample_rate,
                    buffer_frames
                );
                Ok(CpalHandle {
                    queue,
                    fault,
                    release_tx: Some(release_tx),
                    keeper: Some(keeper),
                })
            }
            Ok(Err(e)) => {
                let _ = keeper.join();
                Err(e)
            }
            Err(_) => {
                drop(release_tx);
                Err(CaptureError::DeviceUnavailable(
                    "timed out opening input stream".into(),
                ))
            }
        }
    }
}

/// An open CPAL input stream.
///
/// Releasing or dropping the handle stops the stream and joins its keeper thread.
pub struct CpalHandle {
    queue: Arc<BlockingSampleQueue>,
    fault: Arc<Mutex<Option<String>>>,
    release_tx: Option<Sender<()>>,
    keeper: Option<thread::JoinHandle<()>>,
}

impl CpalHandle {
    fn shutdown(&mut self) {
        self.queue.close();
        if let Some(tx) = self.release_tx.take() {
            let _ = tx.send(());
        }
        if let Some(keeper) = self.keeper.take() {
            if keeper.join().is_err() {
                log::error!("Input stream thread panicked");
            }
        }
        let dropped = self.queue.dropped_samples();
        if dropped > 0 {
            log::warn!("Input overrun dropped {} samples", dropped);
        }
    }
}

impl InputHandle for CpalHandle {
    fn read(&mut self, buf: &mut [i16]) -> Result<usize, CaptureError> {
        if let Some(message) = self.fault.lock().as_ref() {
            return Err(CaptureError::DeviceReadError(message.clone()));
        }
        Ok(self.queue.read_timeout(buf, READ_TIMEOUT))
    }

    fn release(mut self) {
        self.shutdown();
    }
}

impl Drop for CpalHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A supported stream configuration chosen for a requested rate.
#[derive(Debug, Clone)]
struct StreamSelection {
    config: StreamConfig,
    sample_format: SampleFormat,
}

/// Lower ranks are preferred: mono before multi-channel, then i16, f32, u16.
fn config_rank(channels: u16, format: SampleFormat) -> Option<(u8, u8)> {
    let format_rank = match format {
        SampleFormat::I16 => 0,
        SampleFormat::F32 => 1,
        SampleFormat::U16 => 2,
        _ => return None,
    };
    let channel_rank = if channels == 1 { 0 } else { 1 };
    Some((channel_rank, format_rank))
}

fn select_config(device: &Device, sample_rate: u32) -> Result<StreamSelection, CaptureError> {
    let rate = SampleRate(sample_rate);
    let ranges = device.supported_input_configs().map_err(|e| {
        CaptureError::DeviceUnavailable(format!("failed to query input configs: {}", e))
    })?;

    let best = ranges
        .filter(|range| range.min_sample_rate() <= rate && rate <= range.max_sample_rate())
        .filter_map(|range| {
            config_rank(range.channels(), range.sample_format()).map(|rank| (rank, range))
        })
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, range)| range)
        .ok_or_else(|| {
            CaptureError::DeviceUnavailable(format!(
                "input device cannot capture {} Hz natively",
                sample_rate
            ))
        })?;

    let supported = best.with_sample_rate(rate);
    let sample_format = supported.sample_format();
    let mut config: StreamConfig = supported.config();
    config.buffer_size = BufferSize::Default;

    Ok(StreamSelection {
        config,
        sample_format,
    })
}

/// Resolve the device, pick a config and start the stream. Runs on the keeper thread.
fn open_stream(
    device_name: Option<&str>,
    sample_rate: u32,
    queue: Arc<BlockingSampleQueue>,
    fault: Arc<Mutex<Option<String>>>,
) -> Result<Stream, CaptureError> {
    let device = DeviceEnumerator::new().resolve(device_name)?;
    let selection = select_config(&device, sample_rate)?;
    log::debug!(
        "Input config: {} channels, {:?}",
        selection.config.channels,
        selection.sample_format
    );

    let stream = match selection.sample_format {
        SampleFormat::I16 => build_stream_typed::<i16>(&device, &selection.config, queue, fault),
        SampleFormat::F32 => build_stream_typed::<f32>(&device, &selection.config, queue, fault),
        SampleFormat::U16 => build_stream_typed::<u16>(&device, &selection.config, queue, fault),
        other => Err(CaptureError::DeviceUnavailable(format!(
            "unsupported sample format {:?}",
            other
        ))),
    }?;

    stream.play().map_err(|e| {
        CaptureError::DeviceUnavailable(format!("failed to start input stream: {}", e))
    })?;
    Ok(stream)
}

fn build_stream_typed<T>(
    device: &Device,
    config: &StreamConfig,
    queue: Arc<BlockingSampleQueue>,
    fault: Arc<Mutex<Option<String>>>,
) -> Result<Stream, CaptureError>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();
    let mut pcm: Vec<i16> = Vec::new();

    let err_fn = move |err: StreamError| match err {
        StreamError::DeviceNotAvailable => {
            log::error!("Input device disappeared");
            *fault.lock() = Some("input device no longer available".into());
        }
        other => log::warn!("Input stream error: {}", other),
    };

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                convert_to_mono_i16(data, channels, &mut scratch, &mut pcm);
                queue.push(&pcm);
            },
            err_fn,
            None,
        )
        .map_err(|e| {
            CaptureError::DeviceUnavailable(format!("failed to build input stream: {}", e))
        })
}

/// Convert an interleaved device buffer to mono 16-bit PCM in `out`.
fn convert_to_mono_i16<T>(data: &[T], channels: usize, scratch: &mut Vec<f32>, out: &mut Vec<i16>)
where
    T: Sample,
    f32: FromSample<T>,
{
    scratch.clear();
    scratch.extend(data.iter().map(|&s| s.to_sample::<f32>()));

    out.clear();
    if channels <= 1 {
        out.extend(scratch.iter().map(|&s| f32_to_i16(s)));
    } else {
        out.extend(downmix_to_mono(scratch, channels).into_iter().map(f32_to_i16));
    }
}
