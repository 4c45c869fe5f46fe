//! WAV container format utilities.
//!
//! Generates the canonical 44-byte RIFF/WAVE header, parses it back, and
//! converts samples into the little-endian 16-bit payload that follows it.
//! Everything here is pure: no I/O.

/// Size of the canonical WAV header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Largest payload whose RIFF chunk size (`data + 36`) still fits in 32 bits.
pub const MAX_DATA_BYTES: u32 = u32::MAX - 36;

/// Generate the final 44-byte header for `pcm_byte_count` bytes of payload.
///
/// Layout (all integers little-endian):
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    chunk size = 36 + data size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM fmt chunk size)
/// [20-21]  1 (linear PCM)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bits_per_sample / 8
/// [32-33]  block_align = channels * bits_per_sample / 8
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  data size
/// ```
///
/// Both size fields are 32-bit. A byte count above `u32::MAX` is truncated,
/// so callers that can exceed `MAX_DATA_BYTES` must cap the payload first.
/// The byte rate field is truncated the same way; `PcmFormat::validate`
/// keeps real formats well inside it.
pub fn write_header(
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    pcm_byte_count: u64,
) -> [u8; WAV_HEADER_SIZE] {
    let byte_rate = (sample_rate as u64 * channels as u64 * bits_per_sample as u64 / 8) as u32;
    let block_align = (channels as u32 * bits_per_sample as u32 / 8) as u16;
    let data_size = pcm_byte_count as u32;
    let chunk_size = data_size.wrapping_add(36);

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bits_per_sample.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Zero-filled header written at open time to reserve offsets 0..44.
pub fn placeholder_header() -> [u8; WAV_HEADER_SIZE] {
    [0u8; WAV_HEADER_SIZE]
}

/// Header fields read back from a finalized artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedHeader {
    pub chunk_size: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

/// Parse a canonical PCM header. Returns None for anything else, including the
/// zero placeholder of an artifact that was never finalized.
pub fn parse_header(bytes: &[u8]) -> Option<ParsedHeader> {
    if bytes.len() < WAV_HEADER_SIZE {
        return None;
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" || &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data"
    {
        return None;
    }
    if read_u32(bytes, 16) != 16 || read_u16(bytes, 20) != 1 {
        return None;
    }

    Some(ParsedHeader {
        chunk_size: read_u32(bytes, 4),
        channels: read_u16(bytes, 22),
        sample_rate: read_u32(bytes, 24),
        byte_rate: read_u32(bytes, 28),
        block_align: read_u16(bytes, 32),
        bits_per_sample: read_u16(bytes, 34),
        data_size: read_u32(bytes, 40),
    })
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

/// Append `samples` to `out` as little-endian 16-bit words.
pub fn samples_to_le_bytes(samples: &[i16], out: &mut Vec<u8>) {
    out.reserve(samples.len() * 2);
    for &sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
}

/// Convert a float sample in [-1.0, 1.0] to 16-bit PCM, clamping out-of-range input.
pub fn f32_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * i16::MAX as f32) as i16
}

/// Downmix interleaved multi-channel audio to mono by averaging channels per frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let frame_count = samples.len() / channels;
    let scale = 1.0 / channels as f32;
    let mut mono = Vec::with_capacity(frame_count);
    for frame in samples.chunks_exact(channels) {
        mono.push(frame.iter().sum::<f32>() * scale);
    }
    mono
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(header: &[u8], offset: usize) -> u32 {
        read_u32(header, offset)
    }

    #[test]
    fn header_size_is_44_bytes() {
        let header = write_header(16000, 1, 16, 0);
        assert_eq!(header.len(), 44);
    }

    #[test]
    fn header_riff_magic() {
        let header = write_header(16000, 1, 16, 0);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
    }

    #[test]
    fn header_pcm_format() {
        let header = write_header(16000, 1, 16, 0);
        assert_eq!(u16::from_le_bytes([header[20], header[21]]), 1);
        assert_eq!(u32_at(&header, 16), 16);
    }

    #[test]
    fn header_16khz_mono_three_reads() {
        // Three 4096-byte device reads.
        let header = write_header(16000, 1, 16, 12_288);

        assert_eq!(u16::from_le_bytes([header[22], header[23]]), 1);
        assert_eq!(u32_at(&header, 24), 16000);
        assert_eq!(u32_at(&header, 28), 32000);
        assert_eq!(u16::from_le_bytes([header[32], header[33]]), 2);
        assert_eq!(u16::from_le_bytes([header[34], header[35]]), 16);
        assert_eq!(u32_at(&header, 40), 12_288);
        assert_eq!(u32_at(&header, 4), 12_324);
    }

    #[test]
    fn size_fields_hold_for_common_rates() {
        for &rate in &[8000u32, 16000, 22050, 44100, 48000] {
            for &bytes in &[0u64, 2, 4096, 1_000_000] {
                let parsed = parse_header(&write_header(rate, 1, 16, bytes)).unwrap();
                assert_eq!(parsed.chunk_size as u64, bytes + 36);
                assert_eq!(parsed.data_size as u64, bytes);
                assert_eq!(parsed.byte_rate, rate * 2);
                assert_eq!(parsed.block_align, 2);
            }
        }
    }

    #[test]
    fn empty_payload_has_chunk_size_36() {
        let header = write_header(16000, 1, 16, 0);
        assert_eq!(u32_at(&header, 4), 36);
        assert_eq!(u32_at(&header, 40), 0);
    }

    #[test]
    fn oversized_count_is_truncated_to_32_bits() {
        let header = write_header(16000, 1, 16, (1u64 << 32) + 10);
        assert_eq!(u32_at(&header, 40), 10);
        assert_eq!(u32_at(&header, 4), 46);
    }

    #[test]
    fn absurd_rate_truncates_byte_rate_instead_of_panicking() {
        let header = write_header(300_000_000, 1, 16, 128);
        assert_eq!(u32_at(&header, 24), 300_000_000);
        assert_eq!(u32_at(&header, 28), 600_000_000);

        let header = write_header(u32::MAX, u16::MAX, u16::MAX, 0);
        let expected = (u32::MAX as u64 * u16::MAX as u64 * u16::MAX as u64 / 8) as u32;
        assert_eq!(u32_at(&header, 28), expected);
    }

    #[test]
    fn ceiling_fills_chunk_size_exactly() {
        let header = write_header(16000, 1, 16, MAX_DATA_BYTES as u64);
        assert_eq!(u32_at(&header, 4), u32::MAX);
    }

    #[test]
    fn placeholder_does_not_parse() {
        assert_eq!(placeholder_header(), [0u8; 44]);
        assert!(parse_header(&placeholder_header()).is_none());
        assert!(parse_header(b"RIFF").is_none());
    }

    #[test]
    fn samples_serialize_little_endian() {
        let mut out = vec![0xFF];
        samples_to_le_bytes(&[1, -2, i16::MAX], &mut out);
        assert_eq!(out, vec![0xFF, 0x01, 0x00, 0xFE, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn f32_conversion_clamps() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), -i16::MAX);
        assert_eq!(f32_to_i16(2.5), i16::MAX);
        assert_eq!(f32_to_i16(-2.5), -i16::MAX);
    }

    #[test]
    fn downmix_stereo_to_mono() {
        let stereo = [0.2, 0.8, 0.4, 0.6];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.5).abs() < 1e-6);
        assert!((mono[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downmix_mono_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1), samples);
    }
}
