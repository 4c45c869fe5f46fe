use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::models::audio_models::PcmFormat;
use crate::models::error::CaptureError;
use crate::processing::wav_format::{self, ParsedHeader, WAV_HEADER_SIZE};

/// Streaming WAV container writer.
///
/// Reserves the 44-byte header region with a zero placeholder on creation,
/// streams PCM after it, and rewrites the header in place once the payload
/// size is known. Works over any `Write + Seek`: a buffered file for
/// recordings, a `Cursor<Vec<u8>>` for in-memory encoding.
///
/// ## Layout
///
/// ```text
/// [44-byte header: zeros until finalized]
/// [raw little-endian 16-bit PCM...]
/// ```
pub struct WavWriter<W: Write + Seek> {
    inner: W,
    pcm_bytes: u64,
    scratch: Vec<u8>,
}

/// A PCM destination that can be made durable before its header is patched.
pub trait DurableStream: Write + Seek {
    /// Flush buffered bytes and push them to stable storage.
    fn sync(&mut self) -> io::Result<()>;
}

impl DurableStream for BufWriter<File> {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.get_ref().sync_all()
    }
}

impl WavWriter<BufWriter<File>> {
    /// Create (or truncate) the artifact at `path` and write the placeholder.
    pub fn create(path: &Path) -> Result<Self, CaptureError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CaptureError::io("failed to create directory", e))?;
        }

        let file = File::create(path).map_err(|e| CaptureError::io("failed to create artifact", e))?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write + Seek> WavWriter<W> {
    /// Wrap `inner` and write the zero placeholder at its current position,
    /// which must be the start of the stream.
    pub fn new(mut inner: W) -> Result<Self, CaptureError> {
        inner
            .write_all(&wav_format::placeholder_header())
            .map_err(|e| CaptureError::io("failed to reserve header", e))?;
        Ok(Self {
            inner,
            pcm_bytes: 0,
            scratch: Vec::new(),
        })
    }

    /// Append raw PCM bytes after the header region.
    pub fn append(&mut self, pcm: &[u8]) -> Result<(), CaptureError> {
        self.inner
            .write_all(pcm)
            .map_err(|e| CaptureError::io("write failed", e))?;
        self.pcm_bytes += pcm.len() as u64;
        Ok(())
    }

    /// Serialize `samples` as little-endian 16-bit words and append them.
    pub fn append_samples(&mut self, samples: &[i16]) -> Result<(), CaptureError> {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        wav_format::samples_to_le_bytes(samples, &mut scratch);
        let result = self.append(&scratch);
        self.scratch = scratch;
        result
    }

    /// PCM bytes appended so far (header excluded).
    pub fn pcm_bytes(&self) -> u64 {
        self.pcm_bytes
    }

    /// Write the final header over the placeholder and hand back the stream.
    pub fn finalize(mut self, format: &PcmFormat) -> Result<(W, u64), CaptureError> {
        let header = wav_format::write_header(
            format.sample_rate,
            format.channels,
            format.bits_per_sample,
            self.pcm_bytes,
        );
        patch_header(&mut self.inner, &header).map_err(|e| CaptureError::io("failed to patch header", e))?;
        Ok((self.inner, self.pcm_bytes))
    }
}

impl<W: DurableStream> WavWriter<W> {
    /// Flush and sync the stream, leaving the placeholder header untouched.
    /// Returns the payload size.
    pub fn close(mut self) -> Result<u64, CaptureError> {
        self.inner
            .sync()
            .map_err(|e| CaptureError::io("failed to flush pcm stream", e))?;
        Ok(self.pcm_bytes)
    }
}

/// Overwrite bytes 0..44 of `stream` with `header` and return to the end.
pub fn patch_header<W: Write + Seek>(stream: &mut W, header: &[u8; WAV_HEADER_SIZE]) -> io::Result<()> {
    stream.flush()?;
    stream.seek(SeekFrom::Start(0))?;
    stream.write_all(header)?;
    stream.seek(SeekFrom::End(0))?;
    stream.flush()
}

/// Reopen a closed artifact for random-access write and patch its header.
///
/// The file is never created or truncated here: if it was deleted or replaced
/// by something shorter than a header since capture, this fails with
/// `IoError` and the payload is left as it is.
pub fn finalize_artifact(path: &Path, header: &[u8; WAV_HEADER_SIZE]) -> Result<(), CaptureError> {
    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|e| CaptureError::io("failed to reopen artifact", e))?;

    let len = file
        .metadata()
        .map_err(|e| CaptureError::io("failed to stat artifact", e))?
        .len();
    if len < WAV_HEADER_SIZE as u64 {
        return Err(CaptureError::IoError(format!(
            "artifact is {} bytes, shorter than its header",
            len
        )));
    }

    patch_header(&mut file, header).map_err(|e| CaptureError::io("failed to patch header", e))?;
    file.sync_all()
        .map_err(|e| CaptureError::io("failed to sync artifact", e))?;
    Ok(())
}

/// Read the header of an artifact on disk. `Ok(None)` means the file exists
/// but is not a finalized PCM WAV (for example, an orphaned placeholder).
pub fn inspect_artifact(path: &Path) -> Result<Option<ParsedHeader>, CaptureError> {
    let mut file = File::open(path).map_err(|e| CaptureError::io("failed to open artifact", e))?;
    let mut header = [0u8; WAV_HEADER_SIZE];
    match file.read_exact(&mut header) {
        Ok(()) => Ok(wav_format::parse_header(&header)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(CaptureError::io("failed to read artifact header", e)),
    }
}

/// Encode `samples` as a complete WAV file in memory.
pub fn encode_wav(format: &PcmFormat, samples: &[i16]) -> Result<Vec<u8>, CaptureError> {
    let mut writer = WavWriter::new(Cursor::new(Vec::with_capacity(WAV_HEADER_SIZE + samples.len() * 2)))?;
    writer.append_samples(samples)?;
    let (cursor, _) = writer.finalize(format)?;
    Ok(cursor.into_inner())
}

/// Delete an artifact the caller no longer wants. A missing file is not an error.
pub fn discard_artifact(path: &Path) -> Result<(), CaptureError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CaptureError::io("failed to delete artifact", e)),
    }
}
